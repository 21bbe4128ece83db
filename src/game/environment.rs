use crate::Utility;
use rand::rngs::SmallRng;

/// Symmetric two-seat simulator.
///
/// Every matchup and training episode owns its own clone, so implementations
/// must not share mutable state between clones.
pub trait Environment: Clone + Send + Sync {
    type Observation: Clone + Send;
    type Action: Copy + Send + std::fmt::Debug;
    /// Human-readable name used in run directories and logs.
    fn name(&self) -> String;
    /// Start a new episode and return the initial observation of each seat.
    fn reset(&mut self, rng: &mut SmallRng) -> [Self::Observation; 2];
    /// Apply one joint action. Errors are simulation crashes.
    fn step(&mut self, actions: [Self::Action; 2]) -> anyhow::Result<Transition<Self::Observation>>;
}

/// Result of one joint action.
#[derive(Debug, Clone)]
pub struct Transition<O> {
    pub observations: [O; 2],
    pub rewards: [Utility; 2],
    pub done: [bool; 2],
}

impl<O> Transition<O> {
    /// An episode ends once every seat has terminated.
    pub fn terminal(&self) -> bool {
        self.done.iter().all(|done| *done)
    }
}
