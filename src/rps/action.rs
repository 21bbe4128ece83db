use crate::Utility;

/// A single throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RpsAction {
    R,
    P,
    S,
}

impl RpsAction {
    pub const ALL: [Self; 3] = [Self::R, Self::P, Self::S];

    pub fn index(self) -> usize {
        self as usize
    }
    /// Payoff of `self` against `other`.
    pub fn payoff(self, other: Self) -> Utility {
        match (self, other) {
            (Self::R, Self::S) | (Self::P, Self::R) | (Self::S, Self::P) => 1.0,
            (Self::S, Self::R) | (Self::R, Self::P) | (Self::P, Self::S) => -1.0,
            _ => 0.0,
        }
    }
    /// Best response to empirical opponent action counts.
    /// Ties go to the earliest action, which keeps play deterministic.
    pub fn respond(counts: &[f64; 3]) -> Self {
        Self::ALL
            .iter()
            .map(|a| {
                let value = Self::ALL
                    .iter()
                    .map(|b| counts[b.index()] * a.payoff(*b))
                    .sum::<Utility>();
                (*a, value)
            })
            .fold((Self::R, f64::NEG_INFINITY), |best, next| {
                if next.1 > best.1 { next } else { best }
            })
            .0
    }
}
