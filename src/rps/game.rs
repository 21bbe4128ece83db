use super::action::RpsAction;
use crate::Environment;
use crate::Transition;
use rand::rngs::SmallRng;

/// One simultaneous throw per episode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rps;

impl Environment for Rps {
    type Observation = ();
    type Action = RpsAction;
    fn name(&self) -> String {
        "rps".to_string()
    }
    fn reset(&mut self, _: &mut SmallRng) -> [Self::Observation; 2] {
        [(), ()]
    }
    fn step(&mut self, [a, b]: [Self::Action; 2]) -> anyhow::Result<Transition<Self::Observation>> {
        Ok(Transition {
            observations: [(), ()],
            rewards: [a.payoff(b), b.payoff(a)],
            done: [true, true],
        })
    }
}
