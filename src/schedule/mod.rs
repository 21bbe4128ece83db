//! Checkpoint boundaries and the segment-by-segment training loop.
//!
//! - `schedule`: Validated, strictly ascending checkpoint boundaries
//! - `state`: Scheduler lifecycle
//! - `scheduler`: Trains between boundaries and freezes at each one

mod schedule;
mod scheduler;
mod state;

pub use schedule::*;
pub use scheduler::*;
pub use state::*;
