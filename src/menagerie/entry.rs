use crate::Iteration;
use std::path::Path;
use std::path::PathBuf;

/// One admitted snapshot and where it was persisted.
#[derive(Debug, Clone)]
pub struct Entry<S> {
    iteration: Iteration,
    snapshot: S,
    path: PathBuf,
}

impl<S> Entry<S> {
    pub fn new(iteration: Iteration, snapshot: S, path: PathBuf) -> Self {
        Self {
            iteration,
            snapshot,
            path,
        }
    }
    pub fn iteration(&self) -> Iteration {
        self.iteration
    }
    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
