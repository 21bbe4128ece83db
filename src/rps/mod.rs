//! Rock-Paper-Scissors reference implementation.
//!
//! A deterministic symmetric zero-sum game and a fictitious-play agent that
//! best-responds to the opponent actions it has seen. Used by the trainer
//! binary, the benches, and as a test harness for the whole pipeline.

mod action;
mod agent;
mod game;

pub use action::*;
pub use agent::*;
pub use game::*;
