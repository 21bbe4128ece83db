use crate::Evolution;
use crate::NashDistribution;
use crate::NashSolver;
use crate::Outcome;
use crate::PRIOR_GAMES;
use crate::Probability;
use crate::WinrateMatrix;

/// Running match statistics for iterated Nash response.
///
/// Only the training agent plays during training, so the table between
/// menagerie slots is filled one row at a time: the agent accumulates a
/// live row against every existing slot, and when it is frozen into a new
/// slot that live row becomes the new slot's row. The equilibrium over the
/// table therefore only changes on admission, and is cached until then.
#[derive(Debug, Clone)]
pub struct NashResponse {
    evolution: Evolution,
    scores: Vec<Vec<Probability>>,
    games: Vec<Vec<Probability>>,
    live: Vec<(Probability, Probability)>,
    cache: Option<NashDistribution>,
}

impl From<NashSolver> for NashResponse {
    fn from(solver: NashSolver) -> Self {
        Self {
            evolution: Evolution::from(solver),
            scores: Vec::new(),
            games: Vec::new(),
            live: Vec::new(),
            cache: None,
        }
    }
}

impl NashResponse {
    /// Number of menagerie slots covered.
    pub fn size(&self) -> usize {
        self.scores.len()
    }

    /// Record a training episode of the agent against `slot`.
    pub fn observe(&mut self, slot: usize, outcome: Outcome) {
        if let Some((score, games)) = self.live.get_mut(slot) {
            *score += outcome.score();
            *games += 1.0;
        }
    }

    /// Freeze the live row into a new slot and start a fresh one.
    pub fn admit(&mut self) {
        let n = self.size();
        let live = std::mem::take(&mut self.live);
        for (i, (score, games)) in live.iter().enumerate() {
            self.scores[i].push(games - score);
            self.games[i].push(*games);
        }
        self.scores.push(live.iter().map(|(score, _)| *score).chain([0.0]).collect());
        self.games.push(live.iter().map(|(_, games)| *games).chain([0.0]).collect());
        self.live = vec![(0.0, 0.0); n + 1];
        self.cache = None;
    }

    /// Smoothed win-rate estimate: unplayed pairs sit at 0.5.
    pub fn estimate(&self) -> WinrateMatrix {
        let n = self.size();
        let mut matrix = WinrateMatrix::new(n);
        for i in 0..n {
            for j in i + 1..n {
                let p = (self.scores[i][j] + 0.5 * PRIOR_GAMES) / (self.games[i][j] + PRIOR_GAMES);
                matrix.set(i, j, p);
            }
        }
        matrix
    }

    /// Equilibrium over the current table, solved at most once per admission.
    pub fn distribution(&mut self) -> &NashDistribution {
        if self.cache.is_none() {
            let ref estimate = self.estimate();
            let equilibrium = self.evolution.next(estimate);
            if !equilibrium.is_converged() {
                log::debug!(
                    "opponent equilibrium over {} slots is approximate (residual {:.3e})",
                    self.size(),
                    equilibrium.residual()
                );
            }
            self.cache = Some(equilibrium.distribution().clone());
        }
        self.cache.get_or_insert_with(|| NashDistribution::uniform(0))
    }
}
