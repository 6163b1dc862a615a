use serde::{Deserialize, Serialize};

/// Display-ready summary of a location's current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consensus {
    pub location_key: String,
    pub wait_time_minutes: i64,
    pub is_open: bool,
    pub wears_gloves: bool,
    pub wears_mask: bool,
    pub respects_distancing: bool,
    pub stock_level: String,
    pub session_contribution_count: i64,
    pub last_contribution_date: String,
    pub last_contribution_time: String,
}

impl Consensus {
    /// Consensus for a location whose current session holds no contributions.
    pub fn empty(location_key: &str) -> Self {
        Self {
            location_key: location_key.to_string(),
            ..Self::default()
        }
    }
}

/// Outcome of a consensus read. `NotFound` means the location has never
/// been observed, which is distinct from an empty session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusLookup {
    Found(Consensus),
    NotFound,
}

impl ConsensusLookup {
    pub fn found(self) -> Option<Consensus> {
        match self {
            ConsensusLookup::Found(consensus) => Some(consensus),
            ConsensusLookup::NotFound => None,
        }
    }
}
