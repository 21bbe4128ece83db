use serde::Deserialize;
use serde::Serialize;

/// Opponent-sampling scheme as named in configuration and run directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Naive,
    FullHistory,
    IteratedNash,
}

impl Scheme {
    pub const ALL: [Self; 3] = [Self::Naive, Self::FullHistory, Self::IteratedNash];

    pub fn name(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::FullHistory => "full_history",
            Self::IteratedNash => "iterated_nash",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Scheme {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| crate::Error::InvalidConfig(format!("unknown self-play scheme {}", s)))
    }
}
