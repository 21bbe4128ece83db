//! Append-only population of frozen snapshots.

mod codec;
mod entry;
mod menagerie;

pub use codec::*;
pub use entry::*;
pub use menagerie::*;
