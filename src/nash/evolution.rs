use super::equilibrium::Equilibrium;
use super::solver::NashSolver;
use crate::NASH_WARM_ITERATIONS;
use crate::Utility;
use crate::WinrateMatrix;
use rayon::prelude::*;

/// Tracks the equilibrium of a growing population. Each solve starts from
/// the previous dual, padded with a zero multiplier for the new entrant.
///
/// Dominated entrants drive the dual toward infinity, and a dual that large
/// can pin the next population's mixture onto a single slot. A warm start
/// that has not converged within a short budget is discarded for a cold
/// solve, so warm starting never changes the converged result.
#[derive(Debug, Clone, Default)]
pub struct Evolution {
    solver: NashSolver,
    dual: Vec<Utility>,
}

impl From<NashSolver> for Evolution {
    fn from(solver: NashSolver) -> Self {
        Self {
            solver,
            dual: Vec::new(),
        }
    }
}

impl Evolution {
    pub fn solver(&self) -> &NashSolver {
        &self.solver
    }

    /// Solve the current population and remember its dual for the next one.
    pub fn next(&mut self, matrix: &WinrateMatrix) -> Equilibrium {
        let budget = self.solver.limit().min(NASH_WARM_ITERATIONS);
        let warm = self.solver.iterations(budget).solve_from(matrix, &self.dual);
        let equilibrium = match warm.is_converged() {
            true => warm,
            false => {
                log::debug!(
                    "warm start over {} slots stalled at residual {:.3e}, solving cold",
                    matrix.size(),
                    warm.residual()
                );
                let cold = self.solver.solve(matrix);
                match cold.is_converged() || cold.residual() <= warm.residual() {
                    true => cold,
                    false => warm,
                }
            }
        };
        self.dual = equilibrium.solution().dual().to_vec();
        equilibrium
    }

    /// Warm-started sweep over every prefix of a complete matrix.
    pub fn sequential(&mut self, matrix: &WinrateMatrix) -> Vec<Equilibrium> {
        (1..=matrix.size())
            .map(|k| self.next(&matrix.prefix(k)))
            .collect()
    }

    /// Independent cold solves of every prefix.
    pub fn prefixes(solver: &NashSolver, matrix: &WinrateMatrix) -> Vec<Equilibrium> {
        (1..=matrix.size())
            .into_par_iter()
            .map(|k| solver.solve(&matrix.prefix(k)))
            .collect()
    }
}
