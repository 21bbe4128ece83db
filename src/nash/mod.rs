//! Maximum-entropy Nash averaging over empirical win-rate matrices.
//!
//! - `logit`: Log-odds transform and clamping
//! - `payoff`: Skew-symmetric payoff induced by a win-rate matrix
//! - `distribution`: Validated mixed strategy over population slots
//! - `equilibrium`: Tagged solver result (converged or approximate)
//! - `solver`: Entropy-dual projected Newton solver
//! - `evolution`: Warm-started solving of growing prefixes

mod distribution;
mod equilibrium;
mod evolution;
mod logit;
mod payoff;
mod solver;

pub use distribution::*;
pub use equilibrium::*;
pub use evolution::*;
pub use logit::*;
pub use payoff::*;
pub use solver::*;
