use crate::CheckpointRecord;
use crate::CheckpointScheduler;
use crate::Config;
use crate::Environment;
use crate::Equilibrium;
use crate::Error;
use crate::Evolution;
use crate::Menagerie;
use crate::Result;
use crate::ResultStore;
use crate::Scheme;
use crate::SelfPlay;
use crate::State;
use crate::Tournament;
use crate::Trainable;
use crate::WinrateMatrix;
use std::path::PathBuf;
use std::sync::Arc;

/// How a configuration's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Completed,
    /// Stopped at a checkpoint boundary on request. Everything up to and
    /// including that checkpoint is persisted.
    Interrupted,
}

/// Outcome of one (scheme, agent) configuration.
#[derive(Debug)]
pub struct Report {
    pub scheme: Scheme,
    pub agent: String,
    pub root: PathBuf,
    pub records: Vec<CheckpointRecord>,
    pub matrix: WinrateMatrix,
    pub status: Status,
}

/// Train, evaluate, and solve, one checkpoint at a time.
///
/// At every boundary the new snapshot is played only against the existing
/// population, the equilibrium of the grown prefix is solved from the
/// previous one, and the record is committed before training resumes.
pub struct Experiment {
    config: Config,
    halt: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl Experiment {
    /// Validates the configuration before anything touches the disk.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            halt: Arc::new(crate::interrupted),
        })
    }

    /// Replace the stop condition polled at checkpoint boundaries.
    pub fn halt_when<F>(self, halt: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            halt: Arc::new(halt),
            ..self
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run directory of one configuration.
    pub fn root(&self, scheme: Scheme, agent: &str) -> PathBuf {
        self.config.output.join(format!("{}-{}", scheme, agent))
    }

    /// Tournament threads per configuration when `configurations` run at
    /// once. Together they stay within the configured concurrency, except
    /// that every configuration keeps at least one thread.
    pub fn concurrency(&self, configurations: usize) -> usize {
        (self.config.concurrency / configurations.max(1)).max(1)
    }

    /// Run one configuration to completion or interruption.
    pub fn run<E, A>(&self, env: E, agent: A, scheme: Scheme) -> Result<Report>
    where
        E: Environment,
        A: Trainable<E>,
    {
        self.execute(env, agent, scheme, self.concurrency(1))
    }

    fn execute<E, A>(&self, env: E, agent: A, scheme: Scheme, threads: usize) -> Result<Report>
    where
        E: Environment,
        A: Trainable<E>,
    {
        let schedule = self.config.schedule()?;
        let name = agent.name();
        let root = self.root(scheme, &name);
        let solver = self.config.solver();
        let tournament = Tournament::new(self.config.episodes_per_matchup, self.config.seed, threads)?;
        let mut store = ResultStore::create(root.join("results"))?;
        let mut menagerie = Menagerie::<E, A::Snapshot>::new(root.join("menagerie"), scheme.name());
        let selfplay = SelfPlay::new(scheme, self.config.curation_interval, solver);
        let mut scheduler = CheckpointScheduler::new(schedule, env.clone(), agent, selfplay, self.config.seed);
        let mut evolution = Evolution::from(solver);
        let mut matrix = WinrateMatrix::new(0);
        let mut status = Status::Completed;
        log::info!("{}-{} starting in {}", scheme, name, root.display());
        while scheduler.advance(&mut menagerie)?.is_some() {
            let population = menagerie.snapshots(scheduler.population());
            tournament.extend(&env, &mut matrix, &population)?;
            let equilibrium = match self.config.strict {
                true => Equilibrium::Converged(evolution.next(&matrix).strict()?),
                false => evolution.next(&matrix),
            };
            log::info!(
                "{}-{} iteration {}: entropy {:.4}, residual {:.2e}{}",
                scheme,
                name,
                scheduler.completed(),
                equilibrium.distribution().entropy(),
                equilibrium.residual(),
                if equilibrium.is_converged() { "" } else { " (approximate)" }
            );
            store.append(CheckpointRecord::from((
                scheduler.completed(),
                matrix.clone(),
                &equilibrium,
            )))?;
            if scheduler.state() != State::Done && (self.halt)() {
                log::warn!("{}-{} interrupted at iteration {}", scheme, name, scheduler.completed());
                status = Status::Interrupted;
                break;
            }
        }
        store.finish(&matrix)?;
        Ok(Report {
            scheme,
            agent: name,
            root,
            records: store.records().to_vec(),
            matrix,
            status,
        })
    }

    /// Run every configured scheme on its own thread, sharing the
    /// configured concurrency between them. A failure or panic in one
    /// configuration never reaches its siblings.
    pub fn run_isolated<E, A>(&self, env: &E, agent: &A) -> Vec<(Scheme, Result<Report>)>
    where
        E: Environment,
        A: Trainable<E> + Clone + Send,
    {
        let threads = self.concurrency(self.config.self_play_schemes.len());
        std::thread::scope(|scope| {
            let handles = self
                .config
                .self_play_schemes
                .iter()
                .map(|&scheme| {
                    let env = env.clone();
                    let agent = agent.clone();
                    (scheme, scope.spawn(move || self.execute(env, agent, scheme, threads)))
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|(scheme, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|panic| Err(Error::Panicked(message(panic.as_ref()))));
                    if let Err(ref error) = result {
                        log::error!("{} failed: {}", scheme, error);
                    }
                    (scheme, result)
                })
                .collect()
        })
    }
}

fn message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Iteration;
    use crate::Rps;
    use crate::RpsAgent;
    use crate::ScheduleError;
    use std::path::Path;

    fn config(output: &Path, checkpoints: Vec<Iteration>, schemes: Vec<Scheme>) -> Config {
        Config {
            checkpoint_iterations: checkpoints,
            episodes_per_matchup: 50,
            seed: 0,
            self_play_schemes: schemes,
            concurrency: 2,
            output: output.to_path_buf(),
            ..Config::default()
        }
    }

    fn never() -> bool {
        false
    }

    #[test]
    fn five_checkpoints_of_naive_self_play() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), vec![0, 10, 20, 30, 40], vec![Scheme::Naive]);
        let experiment = Experiment::new(config).unwrap().halt_when(never);
        let report = experiment.run(Rps, RpsAgent::default(), Scheme::Naive).unwrap();
        assert_eq!(report.status, Status::Completed);
        assert_eq!(report.root, dir.path().join("naive-fictitious"));

        let snapshots = std::fs::read_dir(report.root.join("menagerie")).unwrap().count();
        assert_eq!(snapshots, 5);
        assert_eq!(report.matrix.size(), 5);
        assert!(report.matrix.is_antisymmetric(1e-12));

        let records = ResultStore::read(report.root.join("results")).unwrap();
        assert_eq!(records, report.records);
        let iterations = records.iter().map(|r| r.iteration).collect::<Vec<_>>();
        assert_eq!(iterations, vec![0, 10, 20, 30, 40]);
        for (k, record) in records.iter().enumerate() {
            assert_eq!(record.winrate, report.matrix.prefix(k + 1));
            assert_eq!(record.nash.len(), k + 1);
        }
        let last = records.last().unwrap();
        assert!((last.nash.weights().iter().sum::<f64>() - 1.0).abs() < 1e-6);

        // rock, paper, paper, paper, scissors: the three identical papers
        // split one third between them
        let weights = last.nash.weights();
        let expected = [1.0 / 3.0, 1.0 / 9.0, 1.0 / 9.0, 1.0 / 9.0, 1.0 / 3.0];
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-4, "{:?}", weights);
        }

        let table = std::fs::read_to_string(report.root.join("results").join(ResultStore::NASH)).unwrap();
        assert_eq!(table.lines().count(), 6);
        assert_eq!(table.lines().next(), Some("iteration,0,1,2,3,4"));
        assert!(report.root.join("results").join(ResultStore::FINAL).exists());
    }

    #[test]
    fn single_checkpoint_is_trivial() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), vec![0], vec![Scheme::FullHistory]);
        let experiment = Experiment::new(config).unwrap().halt_when(never);
        let report = experiment.run(Rps, RpsAgent::default(), Scheme::FullHistory).unwrap();
        assert_eq!(report.matrix.rows(), vec![vec![0.5]]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].nash.weights(), &[1.0]);
    }

    #[test]
    fn interruption_stops_at_a_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), vec![0, 10, 20], vec![Scheme::Naive]);
        let experiment = Experiment::new(config).unwrap().halt_when(|| true);
        let report = experiment.run(Rps, RpsAgent::default(), Scheme::Naive).unwrap();
        assert_eq!(report.status, Status::Interrupted);
        assert_eq!(report.records.len(), 1);
        assert_eq!(ResultStore::read(report.root.join("results")).unwrap().len(), 1);
        assert_eq!(std::fs::read_dir(report.root.join("menagerie")).unwrap().count(), 1);
    }

    #[test]
    fn invalid_schedule_fails_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let config = config(&output, vec![0, 20, 10], vec![Scheme::Naive]);
        assert!(matches!(
            Experiment::new(config),
            Err(Error::InvalidSchedule(ScheduleError::Unsorted { .. }))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn strict_mode_escalates_non_convergence() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            strict: true,
            tolerance: 0.0,
            iterations: 10,
            ..config(dir.path(), vec![0, 10], vec![Scheme::Naive])
        };
        let experiment = Experiment::new(config).unwrap().halt_when(never);
        let error = experiment.run(Rps, RpsAgent::default(), Scheme::Naive).unwrap_err();
        assert!(matches!(error, Error::NonConvergence { .. }));
    }

    #[test]
    fn isolated_runs_share_the_thread_budget() {
        let dir = tempfile::tempdir().unwrap();
        let split = |concurrency| {
            let config = Config {
                concurrency,
                ..config(dir.path(), vec![0], Scheme::ALL.to_vec())
            };
            let experiment = Experiment::new(config).unwrap();
            (experiment.concurrency(1), experiment.concurrency(Scheme::ALL.len()))
        };
        assert_eq!(split(8), (8, 2));
        assert_eq!(split(9), (9, 3));
        assert_eq!(split(2), (2, 1));
        for concurrency in 1..=16 {
            let (alone, shared) = split(concurrency);
            assert_eq!(alone, concurrency);
            assert!(shared * Scheme::ALL.len() <= concurrency.max(Scheme::ALL.len()));
        }
    }

    #[test]
    fn failing_configuration_leaves_siblings_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), vec![0, 5, 10], Scheme::ALL.to_vec());
        let experiment = Experiment::new(config).unwrap().halt_when(never);
        let blocked = experiment.root(Scheme::Naive, "fictitious").join("results");
        std::fs::create_dir_all(&blocked).unwrap();
        std::fs::write(blocked.join(ResultStore::RECORDS), "").unwrap();

        let results = experiment.run_isolated(&Rps, &RpsAgent::default());
        assert_eq!(results.len(), 3);
        for (scheme, result) in results {
            match scheme {
                Scheme::Naive => assert!(matches!(result, Err(Error::PathCollision(_)))),
                _ => {
                    let report = result.unwrap();
                    assert_eq!(report.scheme, scheme);
                    assert_eq!(report.records.len(), 3);
                    assert_eq!(report.status, Status::Completed);
                }
            }
        }
    }
}
