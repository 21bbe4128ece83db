use crate::Probability;
use crate::Utility;

/// Episode result from one seat's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Win counts 1, loss 0, draw 0.5.
    pub fn score(self) -> Probability {
        match self {
            Self::Win => 1.0,
            Self::Loss => 0.0,
            Self::Draw => 0.5,
        }
    }
    /// The same episode seen from the other seat.
    pub fn flip(self) -> Self {
        match self {
            Self::Win => Self::Loss,
            Self::Loss => Self::Win,
            Self::Draw => Self::Draw,
        }
    }
}

impl From<(Utility, Utility)> for Outcome {
    fn from((mine, theirs): (Utility, Utility)) -> Self {
        match mine.partial_cmp(&theirs) {
            Some(std::cmp::Ordering::Greater) => Self::Win,
            Some(std::cmp::Ordering::Less) => Self::Loss,
            _ => Self::Draw,
        }
    }
}
