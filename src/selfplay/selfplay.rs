use super::opponent::Opponent;
use super::response::NashResponse;
use super::scheme::Scheme;
use crate::Environment;
use crate::Frozen;
use crate::Iteration;
use crate::Menagerie;
use crate::NashSolver;
use crate::Outcome;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::SmallRng;

/// Opponent-sampling scheme with its per-run state.
///
/// A value is owned by exactly one training run and called sequentially;
/// independent runs each clone their own.
#[derive(Debug, Clone)]
pub enum SelfPlay {
    /// Always the most recent snapshot.
    Naive { curation: Option<Iteration> },
    /// Uniform over the whole recorded history.
    FullHistory { curation: Option<Iteration> },
    /// Proportional to the equilibrium of the running win-rate estimate.
    IteratedNash {
        curation: Option<Iteration>,
        response: NashResponse,
    },
}

impl SelfPlay {
    /// Fresh state for `scheme`. With `curation` set, the agent is also
    /// admitted every `curation` training episodes between checkpoints.
    pub fn new(scheme: Scheme, curation: Option<Iteration>, solver: NashSolver) -> Self {
        let curation = curation.filter(|interval| *interval > 0);
        match scheme {
            Scheme::Naive => Self::Naive { curation },
            Scheme::FullHistory => Self::FullHistory { curation },
            Scheme::IteratedNash => Self::IteratedNash {
                curation,
                response: NashResponse::from(solver),
            },
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Naive { .. } => Scheme::Naive,
            Self::FullHistory { .. } => Scheme::FullHistory,
            Self::IteratedNash { .. } => Scheme::IteratedNash,
        }
    }
    pub fn name(&self) -> &'static str {
        self.scheme().name()
    }
    pub fn curation(&self) -> Option<Iteration> {
        match self {
            Self::Naive { curation }
            | Self::FullHistory { curation }
            | Self::IteratedNash { curation, .. } => *curation,
        }
    }

    /// Pick the opponent for the next training episode.
    pub fn sample<E, S>(&mut self, menagerie: &Menagerie<E, S>, rng: &mut SmallRng) -> Opponent
    where
        E: Environment,
        S: Frozen<E>,
    {
        if menagerie.is_empty() {
            return Opponent::Current;
        }
        match self {
            Self::Naive { .. } => Opponent::Frozen(menagerie.len() - 1),
            Self::FullHistory { .. } => Opponent::Frozen(rng.random_range(0..menagerie.len())),
            Self::IteratedNash { response, .. } => {
                while response.size() < menagerie.len() {
                    response.admit();
                }
                match WeightedIndex::new(response.distribution().weights()) {
                    Ok(weights) => Opponent::Frozen(weights.sample(rng)),
                    Err(_) => Opponent::Frozen(rng.random_range(0..menagerie.len())),
                }
            }
        }
    }

    /// Whether the agent should be admitted after `candidate` training
    /// episodes. Checkpoint boundaries are admitted regardless.
    pub fn curate<E, S>(&self, menagerie: &Menagerie<E, S>, candidate: Iteration) -> bool
    where
        E: Environment,
        S: Frozen<E>,
    {
        match self.curation() {
            None => false,
            Some(interval) => {
                candidate % interval == 0
                    && menagerie
                        .latest()
                        .map_or(true, |entry| entry.iteration() < candidate)
            }
        }
    }

    /// Record the result of a finished training episode.
    pub fn observe(&mut self, opponent: Opponent, outcome: Outcome) {
        if let (Self::IteratedNash { response, .. }, Opponent::Frozen(slot)) = (self, opponent) {
            response.observe(slot, outcome);
        }
    }

    /// Bring per-slot state up to date after a menagerie push.
    pub fn admit<E, S>(&mut self, menagerie: &Menagerie<E, S>)
    where
        E: Environment,
        S: Frozen<E>,
    {
        if let Self::IteratedNash { response, .. } = self {
            while response.size() < menagerie.len() {
                response.admit();
            }
        }
    }
}
