use crate::Iteration;
use crate::ScheduleError;
use serde::Deserialize;
use serde::Serialize;

/// Non-empty, strictly ascending checkpoint boundaries.
///
/// Inputs are validated, never repaired: a duplicate or out-of-order
/// boundary is reported with its position instead of being sorted away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Iteration>", try_from = "Vec<Iteration>")]
pub struct Schedule(Vec<Iteration>);

impl Schedule {
    pub fn boundaries(&self) -> &[Iteration] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn get(&self, index: usize) -> Option<Iteration> {
        self.0.get(index).copied()
    }
    /// Final boundary; the total training length.
    pub fn last(&self) -> Iteration {
        self.0.last().copied().unwrap_or_default()
    }
}

impl From<Schedule> for Vec<Iteration> {
    fn from(schedule: Schedule) -> Self {
        schedule.0
    }
}

impl TryFrom<Vec<Iteration>> for Schedule {
    type Error = ScheduleError;
    fn try_from(boundaries: Vec<Iteration>) -> Result<Self, Self::Error> {
        if boundaries.is_empty() {
            return Err(ScheduleError::Empty);
        }
        for (position, pair) in boundaries.windows(2).enumerate() {
            let (previous, iteration) = (pair[0], pair[1]);
            let position = position + 1;
            if iteration == previous {
                return Err(ScheduleError::Duplicate {
                    iteration,
                    position,
                });
            }
            if iteration < previous {
                return Err(ScheduleError::Unsorted {
                    iteration,
                    previous,
                    position,
                });
            }
        }
        Ok(Self(boundaries))
    }
}
