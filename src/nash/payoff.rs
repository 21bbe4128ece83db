use super::logit::logit;
use crate::Utility;
use crate::WinrateMatrix;

/// Skew-symmetric payoff of the symmetric zero-sum game induced by a
/// win-rate matrix: `A[i][j] = -A[j][i]`, zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct Payoff {
    n: usize,
    cells: Vec<Utility>,
}

impl Payoff {
    pub fn size(&self) -> usize {
        self.n
    }
    pub fn get(&self, i: usize, j: usize) -> Utility {
        self.cells[i * self.n + j]
    }
    /// A·v
    pub fn apply(&self, v: &[Utility]) -> Vec<Utility> {
        self.cells
            .chunks(self.n.max(1))
            .take(self.n)
            .map(|row| row.iter().zip(v).map(|(a, b)| a * b).sum())
            .collect()
    }
    /// Frobenius norm, an upper bound on the spectral norm.
    pub fn norm(&self) -> Utility {
        self.cells.iter().map(|a| a * a).sum::<Utility>().sqrt()
    }
}

/// Log-odds payoff when the flag is set, centered win rate otherwise.
/// Antisymmetrized as (P - Pᵀ)/2 so sampling noise cannot break skew symmetry.
impl From<(&WinrateMatrix, bool)> for Payoff {
    fn from((matrix, logodds): (&WinrateMatrix, bool)) -> Self {
        let n = matrix.size();
        let raw = |i: usize, j: usize| match logodds {
            true => logit(matrix.get(i, j)),
            false => matrix.get(i, j) - 0.5,
        };
        let cells = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| (raw(i, j) - raw(j, i)) / 2.0)
            .collect();
        Self { n, cells }
    }
}
