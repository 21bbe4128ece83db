//! Error types for the evaluation pipeline.

use crate::Iteration;
use crate::Utility;
use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a checkpoint list is rejected before any training starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("checkpoint list is empty")]
    Empty,

    #[error("duplicate checkpoint {iteration} at position {position}")]
    Duplicate { iteration: Iteration, position: usize },

    #[error("checkpoint {iteration} at position {position} is below its predecessor {previous}")]
    Unsorted {
        iteration: Iteration,
        previous: Iteration,
        position: usize,
    },
}

/// Main error type for the crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid win-rate matrix: {0}")]
    InvalidMatrix(String),

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("training failed at iteration {iteration}: {source}")]
    Training {
        iteration: Iteration,
        #[source]
        source: anyhow::Error,
    },

    #[error("evaluation of matchup ({i}, {j}) failed: {source}")]
    Evaluation {
        i: usize,
        j: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("menagerie entry {iteration} does not follow {previous}")]
    Unordered {
        iteration: Iteration,
        previous: Iteration,
    },

    #[error("refusing to overwrite existing file {0}")]
    PathCollision(PathBuf),

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt snapshot {path}: {reason}")]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("corrupt result record in {path} at line {line}: {source}")]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record for iteration {iteration} does not follow {previous}")]
    RecordOrder {
        iteration: Iteration,
        previous: Iteration,
    },

    #[error("equilibrium did not converge (residual {residual:.3e} after {iterations} iterations)")]
    NonConvergence { residual: Utility, iterations: usize },

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Wrap an io::Error with the operation and path it failed on.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            operation,
            path,
            source,
        }
    }
}
