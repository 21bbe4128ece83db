use crate::EPISODES_PER_MATCHUP;
use crate::Error;
use crate::Iteration;
use crate::NASH_ITERATIONS;
use crate::NASH_TOLERANCE;
use crate::NashSolver;
use crate::Result;
use crate::Schedule;
use crate::Scheme;
use crate::Utility;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Experiment configuration, read from JSON. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Strictly ascending training iterations at which the agent is frozen.
    pub checkpoint_iterations: Vec<Iteration>,
    pub episodes_per_matchup: usize,
    /// Solve over log-odds of win rates rather than centered win rates.
    pub use_logodds: bool,
    pub seed: u64,
    /// One configuration is run per scheme. A single name is accepted too.
    #[serde(alias = "self_play_scheme", deserialize_with = "schemes")]
    pub self_play_schemes: Vec<Scheme>,
    /// Maximum simultaneous tournament matchups across the whole process.
    /// Configurations run side by side split it between them.
    pub concurrency: usize,
    pub tolerance: Utility,
    pub iterations: usize,
    /// Treat an approximate equilibrium as a failure.
    pub strict: bool,
    /// Additionally admit the agent as an opponent every this many iterations.
    pub curation_interval: Option<Iteration>,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_iterations: vec![0, 10, 20, 30, 40],
            episodes_per_matchup: EPISODES_PER_MATCHUP,
            use_logodds: true,
            seed: 0,
            self_play_schemes: Scheme::ALL.to_vec(),
            concurrency: num_cpus::get(),
            tolerance: NASH_TOLERANCE,
            iterations: NASH_ITERATIONS,
            strict: false,
            curation_interval: None,
            output: PathBuf::from("results"),
        }
    }
}

impl Config {
    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str::<Self>(&text)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject anything that would fail partway through a run.
    pub fn validate(&self) -> Result<()> {
        self.schedule()?;
        if self.episodes_per_matchup == 0 {
            return Err(Error::InvalidConfig("episodes_per_matchup must be positive".to_string()));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be positive".to_string()));
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(Error::InvalidConfig(format!("tolerance {} is not a finite non-negative number", self.tolerance)));
        }
        if self.self_play_schemes.is_empty() {
            return Err(Error::InvalidConfig("no self-play scheme configured".to_string()));
        }
        if let Some(scheme) = self
            .self_play_schemes
            .iter()
            .enumerate()
            .find(|(i, scheme)| self.self_play_schemes[..*i].contains(scheme))
            .map(|(_, scheme)| scheme)
        {
            return Err(Error::InvalidConfig(format!("self-play scheme {} listed twice", scheme)));
        }
        Ok(())
    }

    pub fn schedule(&self) -> Result<Schedule> {
        Ok(Schedule::try_from(self.checkpoint_iterations.clone())?)
    }
    pub fn solver(&self) -> NashSolver {
        NashSolver::new(self.use_logodds)
            .tolerance(self.tolerance)
            .iterations(self.iterations)
    }
}

fn schemes<'de, D>(deserializer: D) -> std::result::Result<Vec<Scheme>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Schemes {
        One(Scheme),
        Many(Vec<Scheme>),
    }
    Ok(match Schemes::deserialize(deserializer)? {
        Schemes::One(scheme) => vec![scheme],
        Schemes::Many(schemes) => schemes,
    })
}
