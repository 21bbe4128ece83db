use super::distribution::NashDistribution;
use super::equilibrium::Equilibrium;
use super::equilibrium::Solution;
use super::payoff::Payoff;
use crate::NASH_ARMIJO;
use crate::NASH_BACKTRACKS;
use crate::NASH_ITERATIONS;
use crate::NASH_RIDGE;
use crate::NASH_STEP;
use crate::NASH_STEP_DECAY;
use crate::NASH_STEP_GROWTH;
use crate::NASH_TOLERANCE;
use crate::Probability;
use crate::Utility;
use crate::WinrateMatrix;

/// Maximum-entropy Nash equilibrium of the symmetric zero-sum game induced
/// by a win-rate matrix.
///
/// Solves the entropy dual `min_{λ≥0} logsumexp(Aλ)`, whose primal mixture
/// is `softmax(Aλ)` and whose gradient is `-Ax`. Strictly dominated
/// strategies push their opponents' multipliers toward infinity, so plain
/// gradient steps crawl; Newton steps on the free coordinates decay those
/// weights geometrically instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NashSolver {
    tolerance: Utility,
    iterations: usize,
    logodds: bool,
}

impl Default for NashSolver {
    fn default() -> Self {
        Self {
            tolerance: NASH_TOLERANCE,
            iterations: NASH_ITERATIONS,
            logodds: true,
        }
    }
}

impl NashSolver {
    pub fn new(logodds: bool) -> Self {
        Self {
            logodds,
            ..Self::default()
        }
    }
    pub fn tolerance(self, tolerance: Utility) -> Self {
        Self { tolerance, ..self }
    }
    pub fn iterations(self, iterations: usize) -> Self {
        Self { iterations, ..self }
    }
    pub fn limit(&self) -> usize {
        self.iterations
    }
    pub fn logodds(&self) -> bool {
        self.logodds
    }
    pub fn payoff(&self, matrix: &WinrateMatrix) -> Payoff {
        Payoff::from((matrix, self.logodds))
    }

    /// Cold start from the uniform mixture.
    pub fn solve(&self, matrix: &WinrateMatrix) -> Equilibrium {
        self.solve_from(matrix, &[])
    }

    /// Warm start from a previous dual. Missing multipliers are zero, extra
    /// ones are dropped, negative ones are projected back onto the bound.
    pub fn solve_from(&self, matrix: &WinrateMatrix, warm: &[Utility]) -> Equilibrium {
        let ref payoff = self.payoff(matrix);
        let dual = (0..payoff.size())
            .map(|i| warm.get(i).copied().unwrap_or(0.0).max(0.0))
            .collect::<Vec<_>>();
        let mut current = Iterate::at(payoff, dual);
        let mut best = current.clone();
        let mut step = NASH_STEP;
        let mut iterations = 0;
        while iterations < self.iterations && !self.settled(current.residual()) {
            match current
                .newton(payoff)
                .or_else(|| current.descend(payoff, &mut step))
            {
                Some(next) => current = next,
                None => break,
            }
            iterations += 1;
            if current.residual() < best.residual() {
                best = current.clone();
            }
        }
        if self.settled(current.residual()) {
            log::trace!(
                "nash {}x{} converged after {} iterations",
                payoff.size(),
                payoff.size(),
                iterations
            );
            Equilibrium::Converged(current.solution(iterations))
        } else {
            let residual = best.residual();
            log::debug!(
                "nash {}x{} stopped at residual {:.3e} after {} iterations",
                payoff.size(),
                payoff.size(),
                residual,
                iterations
            );
            Equilibrium::Approximate(best.solution(iterations), residual)
        }
    }

    /// An exact equilibrium counts even when the tolerance is zero.
    fn settled(&self, residual: Utility) -> bool {
        residual < self.tolerance || residual == 0.0
    }
}

/// Dual point with its induced primal mixture and regrets.
#[derive(Debug, Clone)]
struct Iterate {
    dual: Vec<Utility>,
    mixture: Vec<Probability>,
    regret: Vec<Utility>,
    objective: Utility,
}

impl Iterate {
    fn at(payoff: &Payoff, dual: Vec<Utility>) -> Self {
        let logits = payoff.apply(&dual);
        let max = logits.iter().copied().fold(Utility::NEG_INFINITY, Utility::max);
        let exps = logits.iter().map(|l| (l - max).exp()).collect::<Vec<_>>();
        let total = exps.iter().sum::<Utility>();
        let mixture = exps.into_iter().map(|e| e / total).collect::<Vec<_>>();
        let regret = payoff.apply(&mixture);
        Self {
            objective: max + total.ln(),
            dual,
            mixture,
            regret,
        }
    }

    /// Larger of the best deviation gain and the complementary slackness gap.
    fn residual(&self) -> Utility {
        let regret = self.regret.iter().copied().fold(0.0, Utility::max);
        let gap = self
            .dual
            .iter()
            .zip(&self.regret)
            .map(|(l, r)| l * r)
            .sum::<Utility>()
            .abs();
        regret.max(gap)
    }

    /// Projected Newton step with Armijo backtracking along the projection arc.
    /// Coordinates pinned at zero with an outward gradient take a gradient step.
    fn newton(&self, payoff: &Payoff) -> Option<Self> {
        const ACTIVE: Utility = 1e-12;
        let free = (0..self.dual.len())
            .filter(|&i| self.dual[i] > ACTIVE || self.regret[i] >= 0.0)
            .collect::<Vec<_>>();
        let mut direction = self.regret.clone();
        if !free.is_empty() {
            let hessian = self.hessian(payoff);
            let scale = free.iter().map(|&i| hessian[i][i]).sum::<Utility>() / free.len() as Utility;
            let ridge = NASH_RIDGE * scale.max(Utility::MIN_POSITIVE) + Utility::MIN_POSITIVE;
            let system = free
                .iter()
                .map(|&i| {
                    free.iter()
                        .map(|&j| hessian[i][j] + if i == j { ridge } else { 0.0 })
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>();
            let target = free.iter().map(|&i| self.regret[i]).collect::<Vec<_>>();
            for (&i, d) in free.iter().zip(eliminate(system, target)?) {
                direction[i] = d;
            }
        }
        let mut scale = 1.0;
        for _ in 0..NASH_BACKTRACKS {
            let dual = self
                .dual
                .iter()
                .zip(&direction)
                .map(|(l, d)| (l + scale * d).max(0.0))
                .collect::<Vec<_>>();
            let decrease = dual
                .iter()
                .zip(&self.dual)
                .zip(&self.regret)
                .map(|((new, old), r)| -r * (new - old))
                .sum::<Utility>();
            if decrease < 0.0 {
                let next = Self::at(payoff, dual);
                if next.objective <= self.objective + NASH_ARMIJO * decrease {
                    return Some(next);
                }
            }
            scale *= 0.5;
        }
        None
    }

    /// Projected gradient step, accepted under the quadratic upper bound
    /// implied by the current step size.
    fn descend(&self, payoff: &Payoff, step: &mut Utility) -> Option<Self> {
        const CEILING: Utility = 1e12;
        while *step > Utility::MIN_POSITIVE {
            let dual = self
                .dual
                .iter()
                .zip(&self.regret)
                .map(|(l, r)| (l + *step * r).max(0.0))
                .collect::<Vec<_>>();
            let delta = dual
                .iter()
                .zip(&self.dual)
                .map(|(new, old)| new - old)
                .collect::<Vec<_>>();
            let linear = -delta.iter().zip(&self.regret).map(|(d, r)| d * r).sum::<Utility>();
            let quadratic = delta.iter().map(|d| d * d).sum::<Utility>() / (2.0 * *step);
            let slack = 1e-12 * self.objective.abs().max(1.0);
            let next = Self::at(payoff, dual);
            if next.objective <= self.objective + linear + quadratic + slack {
                *step = (*step * NASH_STEP_GROWTH).min(CEILING);
                return Some(next);
            }
            *step *= NASH_STEP_DECAY;
        }
        None
    }

    /// Aᵀ(diag(x) - xxᵀ)A, using Aᵀx = -Ax.
    fn hessian(&self, payoff: &Payoff) -> Vec<Vec<Utility>> {
        let n = self.dual.len();
        (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| {
                        (0..n)
                            .map(|k| self.mixture[k] * payoff.get(k, i) * payoff.get(k, j))
                            .sum::<Utility>()
                            - self.regret[i] * self.regret[j]
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn solution(self, iterations: usize) -> Solution {
        let residual = self.residual();
        Solution::new(
            NashDistribution::normalize(self.mixture),
            self.regret,
            self.dual,
            residual,
            iterations,
        )
    }
}

/// Gaussian elimination with partial pivoting.
fn eliminate(mut a: Vec<Vec<Utility>>, mut b: Vec<Utility>) -> Option<Vec<Utility>> {
    let n = b.len();
    for k in 0..n {
        let pivot = (k..n).max_by(|&r, &s| a[r][k].abs().total_cmp(&a[s][k].abs()))?;
        if a[pivot][k].abs() < Utility::MIN_POSITIVE {
            return None;
        }
        a.swap(k, pivot);
        b.swap(k, pivot);
        let row = a[k].clone();
        for r in k + 1..n {
            let factor = a[r][k] / row[k];
            for c in k..n {
                a[r][c] -= factor * row[c];
            }
            b[r] -= factor * b[k];
        }
    }
    let mut x = vec![0.0; n];
    for k in (0..n).rev() {
        let tail = (k + 1..n).map(|c| a[k][c] * x[c]).sum::<Utility>();
        x[k] = (b[k] - tail) / a[k][k];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}
