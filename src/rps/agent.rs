use super::action::RpsAction;
use super::game::Rps;
use crate::Frozen;
use crate::Parameter;
use crate::Policy;
use crate::Trainable;
use crate::Trajectory;
use rand::rngs::SmallRng;

/// Fictitious-play learner: counts opponent throws and best-responds.
#[derive(Debug, Clone, Default)]
pub struct RpsAgent {
    counts: [f64; 3],
}

impl From<[f64; 3]> for RpsAgent {
    fn from(counts: [f64; 3]) -> Self {
        Self { counts }
    }
}

impl RpsAgent {
    pub fn counts(&self) -> &[f64; 3] {
        &self.counts
    }
}

impl Policy<Rps> for RpsAgent {
    fn act(&self, _: &(), _: &mut SmallRng) -> RpsAction {
        RpsAction::respond(&self.counts)
    }
}

impl Trainable<Rps> for RpsAgent {
    type Snapshot = RpsSnapshot;
    fn name(&self) -> String {
        "fictitious".to_string()
    }
    fn learn(&mut self, trajectory: &Trajectory<Rps>) -> anyhow::Result<()> {
        let opponent = 1 - trajectory.seat();
        for step in trajectory.steps() {
            self.counts[step.actions[opponent].index()] += 1.0;
        }
        Ok(())
    }
    fn freeze(&self) -> RpsSnapshot {
        RpsSnapshot {
            counts: self.counts,
        }
    }
}

/// Frozen counts of an [`RpsAgent`].
#[derive(Debug, Clone, PartialEq)]
pub struct RpsSnapshot {
    counts: [f64; 3],
}

impl RpsSnapshot {
    pub fn counts(&self) -> &[f64; 3] {
        &self.counts
    }
}

impl Policy<Rps> for RpsSnapshot {
    fn act(&self, _: &(), _: &mut SmallRng) -> RpsAction {
        RpsAction::respond(&self.counts)
    }
}

impl Frozen<Rps> for RpsSnapshot {
    fn parameters(&self) -> Vec<Parameter> {
        self.counts.to_vec()
    }
    fn restore(parameters: &[Parameter]) -> anyhow::Result<Self> {
        let counts = <[f64; 3]>::try_from(parameters)
            .map_err(|_| anyhow::anyhow!("expected 3 counts, found {}", parameters.len()))?;
        anyhow::ensure!(
            counts.iter().all(|c| c.is_finite() && *c >= 0.0),
            "counts must be finite and non-negative: {:?}",
            counts
        );
        Ok(Self { counts })
    }
}
