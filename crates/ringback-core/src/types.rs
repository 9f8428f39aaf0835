use serde::{Deserialize, Serialize};
use std::fmt;
use time::PrimitiveDateTime;

/// Timezone-naive instant used for every timestamp in a normalized record.
pub type Timestamp = PrimitiveDateTime;

/// Opaque caller identity.
///
/// Numeric source values are rendered to their decimal text, so `5551234`
/// and `"5551234"` name the same caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    /// Build a caller id, returning `None` for empty or whitespace-only input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Display status carried over from the source.
///
/// Classification never reads this; it uses [`CallRecord::is_served`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Served,
    NotServed,
    Other,
}

impl CallStatus {
    pub fn label(self) -> &'static str {
        match self {
            CallStatus::Served => "served",
            CallStatus::NotServed => "not_served",
            CallStatus::Other => "other",
        }
    }
}

/// A single call, post-normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Zero-based index of the source row.
    pub row: usize,
    /// `None` when the source had no caller identity; such records are
    /// excluded from per-caller analysis.
    pub caller_id: Option<CallerId>,
    pub direction: Direction,
    pub start_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    pub status: CallStatus,
    /// Seconds; always 0 when the call was not answered.
    pub conversation_secs: u64,
    /// Seconds from `start_time` to answer or abandonment.
    pub waiting_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl CallRecord {
    /// Whether the call reached an agent. `answer_time` is authoritative.
    pub fn is_served(&self) -> bool {
        self.answer_time.is_some()
    }

    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }
}
