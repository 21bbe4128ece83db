//! Durable per-checkpoint results.
//!
//! - `record`: One checkpoint's submatrix and equilibrium
//! - `store`: Append-only record log plus derived tables

mod record;
mod store;

pub use record::*;
pub use store::*;
