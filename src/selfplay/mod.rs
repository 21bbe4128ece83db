//! Opponent sampling during training.
//!
//! - `scheme`: Configuration-level scheme names
//! - `opponent`: Who fills the other seat of a training episode
//! - `response`: Incremental statistics behind iterated Nash response
//! - `selfplay`: Closed set of sampling schemes over a menagerie

mod opponent;
mod response;
mod scheme;
mod selfplay;

pub use opponent::*;
pub use response::*;
pub use scheme::*;
pub use selfplay::*;
