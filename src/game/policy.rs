use super::environment::Environment;
use super::trajectory::Trajectory;
use crate::Parameter;
use rand::rngs::SmallRng;

/// Anything that can occupy a seat.
pub trait Policy<E>
where
    E: Environment,
{
    fn act(&self, observation: &E::Observation, rng: &mut SmallRng) -> E::Action;
}

/// Immutable, inference-only copy of policy parameters.
///
/// Only produced through [`Trainable::freeze`] or by restoring parameters
/// that a frozen snapshot wrote; there is no way to mutate one afterwards.
pub trait Frozen<E>: Policy<E> + Send + Sync + Sized
where
    E: Environment,
{
    /// Flat parameter vector, sufficient to reconstruct identical behavior.
    fn parameters(&self) -> Vec<Parameter>;
    /// Rebuild a snapshot from parameters written by [`Frozen::parameters`].
    fn restore(parameters: &[Parameter]) -> anyhow::Result<Self>;
}

/// Mutable policy under active training.
pub trait Trainable<E>: Policy<E>
where
    E: Environment,
{
    type Snapshot: Frozen<E>;
    /// Human-readable name used in run directories and logs.
    fn name(&self) -> String;
    /// Update from one finished episode. Errors abort the configuration.
    fn learn(&mut self, trajectory: &Trajectory<E>) -> anyhow::Result<()>;
    /// Produce an immutable snapshot of the current parameters.
    fn freeze(&self) -> Self::Snapshot;
}
