use super::schedule::Schedule;
use super::state::State;
use crate::Entry;
use crate::Environment;
use crate::Error;
use crate::Iteration;
use crate::Menagerie;
use crate::Opponent;
use crate::Policy;
use crate::Result;
use crate::SelfPlay;
use crate::TRAINING_LOG_INTERVAL;
use crate::Trainable;
use crate::Trajectory;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::time::Instant;

/// Trains one agent in bounded segments and freezes it at every boundary.
///
/// Segments run strictly in order, each continuing from the agent state the
/// previous one left behind. One training episode is one iteration.
pub struct CheckpointScheduler<E, A>
where
    E: Environment,
    A: Trainable<E>,
{
    schedule: Schedule,
    env: E,
    agent: A,
    selfplay: SelfPlay,
    rng: SmallRng,
    state: State,
    completed: Iteration,
    population: Vec<usize>,
}

impl<E, A> CheckpointScheduler<E, A>
where
    E: Environment,
    A: Trainable<E>,
{
    pub fn new(schedule: Schedule, env: E, agent: A, selfplay: SelfPlay, seed: u64) -> Self {
        Self {
            schedule,
            env,
            agent,
            selfplay,
            rng: SmallRng::seed_from_u64(seed),
            state: State::Idle,
            completed: 0,
            population: Vec::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }
    /// Iterations trained so far.
    pub fn completed(&self) -> Iteration {
        self.completed
    }
    /// Menagerie slots frozen at checkpoint boundaries, one per boundary so far.
    pub fn population(&self) -> &[usize] {
        &self.population
    }
    pub fn agent(&self) -> &A {
        &self.agent
    }
    pub fn selfplay(&self) -> &SelfPlay {
        &self.selfplay
    }
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }
    /// Boundary the next segment trains up to.
    pub fn next(&self) -> Option<Iteration> {
        self.schedule.get(self.population.len())
    }

    /// Train up to the next boundary, freeze, and admit the snapshot.
    /// Returns its menagerie slot, or `None` once every boundary is done.
    pub fn advance(&mut self, menagerie: &mut Menagerie<E, A::Snapshot>) -> Result<Option<usize>> {
        let Some(boundary) = self.next() else {
            self.state = State::Done;
            return Ok(None);
        };
        self.state = State::Training;
        let start = Instant::now();
        self.train(menagerie, boundary)?;
        let slot = menagerie.admit(boundary, self.agent.freeze())?;
        self.selfplay.admit(menagerie);
        self.population.push(slot);
        self.completed = boundary;
        self.state = match self.next() {
            Some(_) => State::Checkpointed,
            None => State::Done,
        };
        log::info!(
            "{} {} checkpoint {}/{} at iteration {} ({:.1?})",
            self.selfplay.name(),
            self.agent.name(),
            self.population.len(),
            self.schedule.len(),
            boundary,
            start.elapsed()
        );
        Ok(Some(slot))
    }

    /// Advance through every remaining boundary.
    pub fn run(&mut self, menagerie: &mut Menagerie<E, A::Snapshot>) -> Result<&[usize]> {
        while self.advance(menagerie)?.is_some() {}
        Ok(&self.population)
    }

    fn train(&mut self, menagerie: &mut Menagerie<E, A::Snapshot>, boundary: Iteration) -> Result<()> {
        let mut logged = Instant::now();
        for iteration in self.completed + 1..=boundary {
            let opponent = self.selfplay.sample(menagerie, &mut self.rng);
            let seat = (iteration % 2) as usize;
            let trajectory = {
                let other: &dyn Policy<E> = match opponent {
                    Opponent::Current => &self.agent,
                    Opponent::Frozen(slot) => menagerie
                        .get(slot)
                        .map(Entry::snapshot)
                        .ok_or_else(|| Error::Training {
                            iteration,
                            source: anyhow::anyhow!("opponent slot {} is missing", slot),
                        })?,
                };
                let seats: [&dyn Policy<E>; 2] = match seat {
                    0 => [&self.agent, other],
                    _ => [other, &self.agent],
                };
                Trajectory::play(&mut self.env, seats, seat, &mut self.rng)
                    .map_err(|source| Error::Training { iteration, source })?
            };
            self.agent
                .learn(&trajectory)
                .map_err(|source| Error::Training { iteration, source })?;
            self.selfplay.observe(opponent, trajectory.outcome());
            if iteration < boundary && self.selfplay.curate(menagerie, iteration) {
                menagerie.admit(iteration, self.agent.freeze())?;
                self.selfplay.admit(menagerie);
                log::debug!("curated snapshot at iteration {}", iteration);
            }
            if logged.elapsed() > TRAINING_LOG_INTERVAL {
                log::info!(
                    "{} {} training {}/{}",
                    self.selfplay.name(),
                    self.agent.name(),
                    iteration,
                    boundary
                );
                logged = Instant::now();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frozen;
    use crate::NashSolver;
    use crate::Rps;
    use crate::RpsAction;
    use crate::RpsAgent;
    use crate::RpsSnapshot;
    use crate::Scheme;
    use std::path::Path;

    fn scheduler(boundaries: Vec<Iteration>, scheme: Scheme, curation: Option<Iteration>) -> CheckpointScheduler<Rps, RpsAgent> {
        let schedule = Schedule::try_from(boundaries).unwrap();
        let selfplay = SelfPlay::new(scheme, curation, NashSolver::default());
        CheckpointScheduler::new(schedule, Rps, RpsAgent::default(), selfplay, 0)
    }

    fn menagerie(root: &Path) -> Menagerie<Rps, RpsSnapshot> {
        Menagerie::new(root.join("menagerie"), "test")
    }

    #[test]
    fn one_snapshot_per_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let ref mut menagerie = menagerie(dir.path());
        let mut scheduler = scheduler(vec![0, 10, 20, 30, 40], Scheme::Naive, None);
        assert_eq!(scheduler.state(), State::Idle);
        assert_eq!(scheduler.run(menagerie).unwrap(), &[0, 1, 2, 3, 4]);
        assert_eq!(scheduler.state(), State::Done);
        assert_eq!(scheduler.completed(), 40);
        let iterations = menagerie.iter().map(Entry::iteration).collect::<Vec<_>>();
        assert_eq!(iterations, vec![0, 10, 20, 30, 40]);
        assert!(menagerie.iter().all(|entry| entry.path().exists()));
        assert_eq!(scheduler.agent().counts().iter().sum::<f64>(), 40.0);
    }

    #[test]
    fn transitions_between_states() {
        let dir = tempfile::tempdir().unwrap();
        let ref mut menagerie = menagerie(dir.path());
        let mut scheduler = scheduler(vec![0, 5], Scheme::FullHistory, None);
        assert_eq!(scheduler.next(), Some(0));
        assert_eq!(scheduler.advance(menagerie).unwrap(), Some(0));
        assert_eq!(scheduler.state(), State::Checkpointed);
        assert_eq!(scheduler.completed(), 0);
        assert_eq!(scheduler.advance(menagerie).unwrap(), Some(1));
        assert_eq!(scheduler.state(), State::Done);
        assert_eq!(scheduler.advance(menagerie).unwrap(), None);
        assert_eq!(scheduler.state(), State::Done);
    }

    #[test]
    fn zero_boundary_freezes_the_initial_agent() {
        let dir = tempfile::tempdir().unwrap();
        let ref mut menagerie = menagerie(dir.path());
        let mut scheduler = scheduler(vec![0], Scheme::IteratedNash, None);
        scheduler.run(menagerie).unwrap();
        assert_eq!(menagerie.len(), 1);
        assert_eq!(menagerie.get(0).unwrap().snapshot(), &RpsAgent::default().freeze());
    }

    #[test]
    fn curation_adds_opponents_but_not_population() {
        let dir = tempfile::tempdir().unwrap();
        let ref mut menagerie = menagerie(dir.path());
        let mut scheduler = scheduler(vec![0, 10], Scheme::FullHistory, Some(4));
        assert_eq!(scheduler.run(menagerie).unwrap(), &[0, 3]);
        let iterations = menagerie.iter().map(Entry::iteration).collect::<Vec<_>>();
        assert_eq!(iterations, vec![0, 4, 8, 10]);
    }

    #[test]
    fn schemes_are_reproducible() {
        for scheme in Scheme::ALL {
            let a = tempfile::tempdir().unwrap();
            let b = tempfile::tempdir().unwrap();
            let mut first = scheduler(vec![0, 7, 19], scheme, Some(3));
            let mut second = scheduler(vec![0, 7, 19], scheme, Some(3));
            first.run(&mut menagerie(a.path())).unwrap();
            second.run(&mut menagerie(b.path())).unwrap();
            assert_eq!(first.agent().counts(), second.agent().counts());
        }
    }

    /// Throws rock and fails to learn after a fixed number of episodes.
    struct Flaky {
        remaining: usize,
    }

    impl Policy<Rps> for Flaky {
        fn act(&self, _: &(), _: &mut SmallRng) -> RpsAction {
            RpsAction::R
        }
    }

    impl Trainable<Rps> for Flaky {
        type Snapshot = RpsSnapshot;
        fn name(&self) -> String {
            "flaky".to_string()
        }
        fn learn(&mut self, _: &Trajectory<Rps>) -> anyhow::Result<()> {
            anyhow::ensure!(self.remaining > 0, "diverged");
            self.remaining -= 1;
            Ok(())
        }
        fn freeze(&self) -> RpsSnapshot {
            RpsSnapshot::restore(&[0.0, 0.0, 0.0]).unwrap()
        }
    }

    #[test]
    fn training_failure_keeps_earlier_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let ref mut menagerie = menagerie(dir.path());
        let schedule = Schedule::try_from(vec![0, 10, 20]).unwrap();
        let selfplay = SelfPlay::new(Scheme::Naive, None, NashSolver::default());
        let mut scheduler = CheckpointScheduler::new(schedule, Rps, Flaky { remaining: 15 }, selfplay, 0);
        let error = scheduler.run(menagerie).unwrap_err();
        assert!(matches!(error, Error::Training { iteration: 16, .. }));
        assert_eq!(scheduler.state(), State::Training);
        assert_eq!(scheduler.population(), &[0, 1]);
        assert_eq!(menagerie.len(), 2);
        assert!(menagerie.iter().all(|entry| entry.path().exists()));
    }
}
