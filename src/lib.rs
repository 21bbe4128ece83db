//! Checkpointed self-play training with game-theoretic evaluation.
//!
//! A training agent is frozen at every checkpoint boundary, the frozen
//! population is played round-robin, and the maximum-entropy Nash
//! equilibrium of each growing population prefix is tracked over time.
//!
//! # Module Structure
//!
//! - `game`: Consumed abstractions (Environment, Policy, Trainable, Frozen)
//! - `menagerie`: Append-only population arena and snapshot codec
//! - `selfplay`: Opponent sampling schemes
//! - `schedule`: Checkpoint validation and the training state machine
//! - `tournament`: Round-robin evaluation into win-rate matrices
//! - `nash`: Maximum-entropy Nash averaging
//! - `store`: Durable per-checkpoint results
//! - `experiment`: Per-configuration pipeline
//! - `rps`: Rock-Paper-Scissors reference implementation

mod config;
mod error;
mod experiment;
mod game;
mod menagerie;
mod nash;
mod rps;
mod schedule;
mod selfplay;
mod store;
mod tournament;

pub use config::*;
pub use error::*;
pub use experiment::*;
pub use game::*;
pub use menagerie::*;
pub use nash::*;
pub use rps::*;
pub use schedule::*;
pub use selfplay::*;
pub use store::*;
pub use tournament::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Training episode counter; checkpoint boundaries are expressed in it.
pub type Iteration = u64;
/// Win rates, mixed strategy weights, and sampling distributions.
pub type Probability = f64;
/// Rewards, log-odds payoffs, and Nash-averaged ratings.
pub type Utility = f64;
/// Serialized policy parameter.
pub type Parameter = f64;

// ============================================================================
// NASH AVERAGING
// Entropy dual: min_{λ≥0} logsumexp(Aλ), primal x = softmax(Aλ).
// Projected Newton with a projected gradient fallback.
// ============================================================================
/// Win rates are clamped to [ε, 1-ε] before the logit transform.
pub const LOGODDS_EPSILON: Probability = 1e-3;
/// Early stopping threshold on maximum regret against the mixture.
pub const NASH_TOLERANCE: Utility = 1e-6;
/// Maximum dual iterations before returning an approximate equilibrium.
pub const NASH_ITERATIONS: usize = 100_000;
/// Dual iterations allowed from a warm start before re-solving cold.
pub const NASH_WARM_ITERATIONS: usize = 64;
/// Sufficient decrease fraction for Newton backtracking.
pub const NASH_ARMIJO: Utility = 1e-4;
/// Relative ridge added to the dual Hessian, which is singular in general.
pub const NASH_RIDGE: Utility = 1e-12;
/// Halvings of the Newton step before falling back to a gradient step.
pub const NASH_BACKTRACKS: usize = 60;
/// Initial fallback gradient step size; adapted multiplicatively.
pub const NASH_STEP: Utility = 1.0;
/// Step growth after an accepted iteration.
pub const NASH_STEP_GROWTH: Utility = 2.0;
/// Step shrinkage after a rejected (non-descending) iteration.
pub const NASH_STEP_DECAY: Utility = 0.5;

// ============================================================================
// EVALUATION & TRAINING
// ============================================================================
/// Default number of episodes per unordered tournament matchup.
pub const EPISODES_PER_MATCHUP: usize = 50;
/// Guard against environments that never terminate.
pub const EPISODE_STEP_LIMIT: usize = 10_000;
/// Pseudo-count prior for unplayed pairs in the running win-rate estimate.
pub const PRIOR_GAMES: Probability = 1.0;
/// Interval between progress log messages within a training segment.
pub const TRAINING_LOG_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Global interrupt flag, checked only at checkpoint boundaries.
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if graceful shutdown was requested.
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}

/// Request graceful shutdown at the next checkpoint boundary.
pub fn interrupt() {
    INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
}

/// Register graceful interrupt handler. Type "Q" + Enter to stop after the
/// current checkpoint has been persisted.
#[cfg(feature = "server")]
pub fn brb() {
    std::thread::spawn(|| {
        loop {
            let ref mut buffer = String::new();
            match std::io::stdin().read_line(buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) if buffer.trim().to_uppercase() == "Q" => {
                    log::warn!("graceful interrupt requested, finishing current checkpoint...");
                    interrupt();
                    break;
                }
                Ok(_) => continue,
            }
        }
    });
}
