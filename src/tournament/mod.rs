//! Round-robin evaluation of frozen populations.
//!
//! - `matrix`: Antisymmetric win-rate matrix over population slots
//! - `tournament`: Bounded-concurrency all-pairs match play

mod matrix;
mod tournament;

pub use matrix::*;
pub use tournament::*;
