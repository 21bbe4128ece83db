/// Occupant of the opponent seat in a training episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opponent {
    /// The training agent itself; only drawn while the menagerie is empty.
    Current,
    /// Menagerie slot.
    Frozen(usize),
}

impl Opponent {
    pub fn slot(self) -> Option<usize> {
        match self {
            Self::Current => None,
            Self::Frozen(slot) => Some(slot),
        }
    }
}
