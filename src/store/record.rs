use crate::Equilibrium;
use crate::Iteration;
use crate::NashDistribution;
use crate::Utility;
use crate::WinrateMatrix;
use serde::Deserialize;
use serde::Serialize;

/// Evaluation of the population prefix frozen up to one checkpoint.
/// Written once, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub iteration: Iteration,
    pub winrate: WinrateMatrix,
    pub nash: NashDistribution,
    pub ratings: Vec<Utility>,
    pub residual: Utility,
    pub converged: bool,
}

impl From<(Iteration, WinrateMatrix, &Equilibrium)> for CheckpointRecord {
    fn from((iteration, winrate, equilibrium): (Iteration, WinrateMatrix, &Equilibrium)) -> Self {
        Self {
            iteration,
            winrate,
            nash: equilibrium.distribution().clone(),
            ratings: equilibrium.solution().ratings().to_vec(),
            residual: equilibrium.residual(),
            converged: equilibrium.is_converged(),
        }
    }
}

impl CheckpointRecord {
    /// Population size at this checkpoint.
    pub fn size(&self) -> usize {
        self.winrate.size()
    }
}
