//! Consumed abstractions: environments, policies, and episodes.

mod environment;
mod outcome;
mod policy;
mod trajectory;

pub use environment::*;
pub use outcome::*;
pub use policy::*;
pub use trajectory::*;
