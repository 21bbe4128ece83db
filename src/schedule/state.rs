/// Lifecycle of a [`super::CheckpointScheduler`].
///
/// `Idle → Training → Checkpointed → (Training | Done)`. A segment that
/// fails leaves the scheduler in `Training`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Training,
    Checkpointed,
    Done,
}
