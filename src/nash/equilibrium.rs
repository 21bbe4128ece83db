use super::distribution::NashDistribution;
use crate::Error;
use crate::Result;
use crate::Utility;

/// Everything the solver knows about its final iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    distribution: NashDistribution,
    ratings: Vec<Utility>,
    dual: Vec<Utility>,
    residual: Utility,
    iterations: usize,
}

impl Solution {
    pub fn new(
        distribution: NashDistribution,
        ratings: Vec<Utility>,
        dual: Vec<Utility>,
        residual: Utility,
        iterations: usize,
    ) -> Self {
        Self {
            distribution,
            ratings,
            dual,
            residual,
            iterations,
        }
    }
    pub fn distribution(&self) -> &NashDistribution {
        &self.distribution
    }
    /// Nash averaging: payoff of each slot against the equilibrium mixture.
    pub fn ratings(&self) -> &[Utility] {
        &self.ratings
    }
    /// Dual multipliers, reusable as a warm start.
    pub fn dual(&self) -> &[Utility] {
        &self.dual
    }
    /// Larger of the maximum regret against the mixture and the entropy duality gap.
    pub fn residual(&self) -> Utility {
        self.residual
    }
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Solver result. Non-convergence is a reported condition, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Equilibrium {
    Converged(Solution),
    Approximate(Solution, Utility),
}

impl Equilibrium {
    pub fn solution(&self) -> &Solution {
        match self {
            Self::Converged(solution) => solution,
            Self::Approximate(solution, _) => solution,
        }
    }
    pub fn into_solution(self) -> Solution {
        match self {
            Self::Converged(solution) => solution,
            Self::Approximate(solution, _) => solution,
        }
    }
    pub fn distribution(&self) -> &NashDistribution {
        self.solution().distribution()
    }
    pub fn residual(&self) -> Utility {
        match self {
            Self::Converged(solution) => solution.residual(),
            Self::Approximate(_, residual) => *residual,
        }
    }
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }
    /// Escalate non-convergence to an error.
    pub fn strict(self) -> Result<Solution> {
        match self {
            Self::Converged(solution) => Ok(solution),
            Self::Approximate(solution, residual) => Err(Error::NonConvergence {
                residual,
                iterations: solution.iterations(),
            }),
        }
    }
}
