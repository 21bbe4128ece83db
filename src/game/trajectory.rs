use super::environment::Environment;
use super::outcome::Outcome;
use super::policy::Policy;
use crate::EPISODE_STEP_LIMIT;
use crate::Utility;
use rand::rngs::SmallRng;

/// One joint step of an episode.
#[derive(Clone)]
pub struct Step<E>
where
    E: Environment,
{
    pub observations: [E::Observation; 2],
    pub actions: [E::Action; 2],
    pub rewards: [Utility; 2],
}

/// A finished episode, viewed from `seat`.
#[derive(Clone)]
pub struct Trajectory<E>
where
    E: Environment,
{
    seat: usize,
    steps: Vec<Step<E>>,
}

impl<E> Trajectory<E>
where
    E: Environment,
{
    /// Run one episode to termination with the given seat assignment.
    /// `seat` marks whose perspective the trajectory reports.
    pub fn play(
        env: &mut E,
        seats: [&dyn Policy<E>; 2],
        seat: usize,
        rng: &mut SmallRng,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(seat < 2, "seat {} out of range", seat);
        let mut steps = Vec::new();
        let mut observations = env.reset(rng);
        loop {
            anyhow::ensure!(
                steps.len() < EPISODE_STEP_LIMIT,
                "{} did not terminate within {} steps",
                env.name(),
                EPISODE_STEP_LIMIT
            );
            let actions = [
                seats[0].act(&observations[0], rng),
                seats[1].act(&observations[1], rng),
            ];
            let transition = env.step(actions)?;
            let terminal = transition.terminal();
            let next = transition.observations;
            steps.push(Step {
                observations: std::mem::replace(&mut observations, next),
                actions,
                rewards: transition.rewards,
            });
            if terminal {
                break;
            }
        }
        Ok(Self { seat, steps })
    }

    pub fn seat(&self) -> usize {
        self.seat
    }
    pub fn steps(&self) -> &[Step<E>] {
        &self.steps
    }
    /// Undiscounted return of each seat.
    pub fn returns(&self) -> [Utility; 2] {
        self.steps.iter().fold([0.0; 2], |[a, b], step| {
            [a + step.rewards[0], b + step.rewards[1]]
        })
    }
    /// Result from the perspective of `seat`.
    pub fn outcome(&self) -> Outcome {
        let returns = self.returns();
        Outcome::from((returns[self.seat], returns[1 - self.seat]))
    }
}
