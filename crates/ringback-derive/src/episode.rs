use ringback_core::{CallerId, Timestamp};
use serde::Serialize;

/// Which missed calls may anchor an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeMode {
    /// Only the caller's first missed call. One outcome per caller; drives
    /// the headline recovery rate.
    FirstMiss,
    /// Every missed call not already covered by a recovered episode.
    PerOccurrence,
}

impl EpisodeMode {
    pub fn label(self) -> &'static str {
        match self {
            EpisodeMode::FirstMiss => "first_miss",
            EpisodeMode::PerOccurrence => "per_occurrence",
        }
    }
}

/// How a missed-call episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A served call followed within the recovery window.
    Recovered {
        /// Source row of the resolving served call.
        row: usize,
        at: Timestamp,
        after_secs: i64,
    },
    /// No further call within the loss window, and the window is fully
    /// covered by the data.
    Lost,
    /// Neither recovered nor lost with the data available.
    Pending,
}

impl Outcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Outcome::Recovered { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Recovered { .. } => "recovered",
            Outcome::Lost => "lost",
            Outcome::Pending => "pending",
        }
    }
}

/// A missed call and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub caller_id: CallerId,
    pub anchor_row: usize,
    pub anchor_at: Timestamp,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Further missed calls between the anchor and the resolving call.
    pub absorbed_misses: usize,
}
