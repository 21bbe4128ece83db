use crate::Error;
use crate::Payoff;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;

/// Empirical probability that slot `i` beats slot `j`.
///
/// `M[i][j] + M[j][i] = 1` off the diagonal and `M[i][i] = 0.5`. Both are
/// maintained by construction: [`WinrateMatrix::set`] writes the complement
/// and the diagonal is never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Probability>>", try_from = "Vec<Vec<Probability>>")]
pub struct WinrateMatrix {
    n: usize,
    cells: Vec<Probability>,
}

impl WinrateMatrix {
    /// Tolerance for the complement check on untrusted input.
    pub const TOLERANCE: Probability = 1e-9;

    /// Every pairing undecided.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![0.5; n * n],
        }
    }
    pub fn size(&self) -> usize {
        self.n
    }
    pub fn get(&self, i: usize, j: usize) -> Probability {
        self.cells[i * self.n + j]
    }
    /// Record that `i` beats `j` with probability `p`. Ignored on the diagonal.
    pub fn set(&mut self, i: usize, j: usize, p: Probability) {
        if i != j {
            let p = p.clamp(0.0, 1.0);
            self.cells[i * self.n + j] = p;
            self.cells[j * self.n + i] = 1.0 - p;
        }
    }
    /// Add an undecided slot.
    pub fn grow(&mut self) {
        let n = self.n + 1;
        let mut cells = vec![0.5; n * n];
        for i in 0..self.n {
            cells[i * n..i * n + self.n].copy_from_slice(&self.cells[i * self.n..(i + 1) * self.n]);
        }
        self.n = n;
        self.cells = cells;
    }
    /// Top-left `k×k` block.
    pub fn prefix(&self, k: usize) -> Self {
        let k = k.min(self.n);
        Self {
            n: k,
            cells: (0..k)
                .flat_map(|i| self.cells[i * self.n..i * self.n + k].iter().copied())
                .collect(),
        }
    }
    pub fn rows(&self) -> Vec<Vec<Probability>> {
        self.cells
            .chunks(self.n.max(1))
            .take(self.n)
            .map(<[Probability]>::to_vec)
            .collect()
    }
    pub fn is_antisymmetric(&self, tolerance: Probability) -> bool {
        (0..self.n).all(|i| {
            (self.get(i, i) - 0.5).abs() <= tolerance
                && (0..self.n).all(|j| (self.get(i, j) + self.get(j, i) - 1.0).abs() <= tolerance)
        })
    }
    /// Skew-symmetric payoff for the equilibrium solver.
    pub fn payoffs(&self, logodds: bool) -> Payoff {
        Payoff::from((self, logodds))
    }
}

impl From<WinrateMatrix> for Vec<Vec<Probability>> {
    fn from(matrix: WinrateMatrix) -> Self {
        matrix.rows()
    }
}

impl TryFrom<Vec<Vec<Probability>>> for WinrateMatrix {
    type Error = Error;
    fn try_from(rows: Vec<Vec<Probability>>) -> Result<Self, Self::Error> {
        let n = rows.len();
        if let Some(i) = rows.iter().position(|row| row.len() != n) {
            return Err(Error::InvalidMatrix(format!(
                "row {} has {} entries, expected {}",
                i,
                rows[i].len(),
                n
            )));
        }
        let matrix = Self {
            n,
            cells: rows.into_iter().flatten().collect(),
        };
        if let Some(p) = matrix.cells.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(Error::InvalidMatrix(format!("entry {} outside [0, 1]", p)));
        }
        if !matrix.is_antisymmetric(Self::TOLERANCE) {
            return Err(Error::InvalidMatrix("entries are not complementary".to_string()));
        }
        Ok(matrix)
    }
}
