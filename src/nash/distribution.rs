use crate::Error;
use crate::Probability;
use serde::Deserialize;
use serde::Serialize;

/// Mixed strategy over population slots: non-negative, sums to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Probability>", try_from = "Vec<Probability>")]
pub struct NashDistribution(Vec<Probability>);

impl NashDistribution {
    /// Allowed deviation of the total mass from one.
    pub const TOLERANCE: Probability = 1e-6;

    /// Normalize non-negative weights. Tiny negative noise is floored at zero.
    pub fn normalize(weights: Vec<Probability>) -> Self {
        let weights = weights.into_iter().map(|w| w.max(0.0)).collect::<Vec<_>>();
        let total = weights.iter().sum::<Probability>();
        match total > 0.0 && total.is_finite() {
            true => Self(weights.into_iter().map(|w| w / total).collect()),
            false => Self::uniform(weights.len()),
        }
    }
    pub fn uniform(n: usize) -> Self {
        Self(vec![1.0 / n.max(1) as Probability; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn weights(&self) -> &[Probability] {
        &self.0
    }
    pub fn get(&self, slot: usize) -> Probability {
        self.0.get(slot).copied().unwrap_or(0.0)
    }
    /// Weights extended with zeros for slots that did not exist yet.
    pub fn padded(&self, width: usize) -> Vec<Probability> {
        let mut weights = self.0.clone();
        weights.resize(width.max(self.0.len()), 0.0);
        weights
    }
    /// Shannon entropy in nats.
    pub fn entropy(&self) -> Probability {
        -self
            .0
            .iter()
            .filter(|p| **p > 0.0)
            .map(|p| p * p.ln())
            .sum::<Probability>()
    }
    /// Slots carrying more than `threshold` mass.
    pub fn support(&self, threshold: Probability) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, p)| **p > threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

impl From<NashDistribution> for Vec<Probability> {
    fn from(distribution: NashDistribution) -> Self {
        distribution.0
    }
}

impl TryFrom<Vec<Probability>> for NashDistribution {
    type Error = Error;
    fn try_from(weights: Vec<Probability>) -> Result<Self, Self::Error> {
        if weights.is_empty() {
            return Err(Error::InvalidDistribution("empty".to_string()));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidDistribution(format!("weight {}", w)));
        }
        let total = weights.iter().sum::<Probability>();
        if (total - 1.0).abs() > Self::TOLERANCE {
            return Err(Error::InvalidDistribution(format!("total mass {}", total)));
        }
        Ok(Self(weights))
    }
}
