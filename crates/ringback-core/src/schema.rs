use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::NormalizeError;

// ── Column aliases ──
//
// Each list is tried in order; the first column present in the input wins.

pub mod alias {
    pub const CALLER_ID: &[&str] = &["callerId", "caller"];
    pub const START_TIME: &[&str] = &["startTime", "start_datetime"];
    pub const ANSWER_TIME: &[&str] = &["answerTime", "answer_datetime", "detailAnswerTime"];
    pub const END_TIME: &[&str] = &["endTime", "end_datetime", "detailExitTime"];
    pub const CONVERSATION_TIME: &[&str] = &["conversationTime", "conversation_time"];
    pub const WAITING_TIME: &[&str] = &["waitingTime", "waiting_time"];
    pub const STATUS: &[&str] = &["status"];
    pub const DIRECTION: &[&str] = &["direction"];
    pub const DESTINATION: &[&str] = &["destination", "detailDestinationName"];
    pub const OPERATOR: &[&str] = &["operator"];
}

/// Which of the known export layouts the input follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `startTime` / `answerTime` / `callerId` ...
    Modern,
    /// `start_datetime` / `answer_datetime` / `caller` ...
    Legacy,
}

/// Source column name resolved for each canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub schema: Schema,
    pub caller_id: &'static str,
    pub start_time: &'static str,
    pub answer_time: Option<&'static str>,
    pub end_time: Option<&'static str>,
    pub conversation_time: Option<&'static str>,
    pub waiting_time: Option<&'static str>,
    pub status: Option<&'static str>,
    pub direction: Option<&'static str>,
    pub destination: Option<&'static str>,
    pub operator: Option<&'static str>,
}

impl ColumnMap {
    /// Resolve canonical fields against the set of columns seen in the input.
    ///
    /// Fails with [`NormalizeError::Schema`] when a required field has no
    /// matching column.
    pub fn resolve(columns: &BTreeSet<String>) -> Result<Self, NormalizeError> {
        let pick = |aliases: &'static [&'static str]| -> Option<&'static str> {
            aliases.iter().copied().find(|a| columns.contains(*a))
        };
        let require = |field: &'static str, aliases: &'static [&'static str]| {
            pick(aliases).ok_or_else(|| NormalizeError::Schema {
                field,
                tried: aliases,
                seen: columns.iter().cloned().collect(),
            })
        };

        let start_time = require("start_time", alias::START_TIME)?;
        let caller_id = require("caller_id", alias::CALLER_ID)?;
        let schema = if start_time == "startTime" {
            Schema::Modern
        } else {
            Schema::Legacy
        };

        Ok(Self {
            schema,
            caller_id,
            start_time,
            answer_time: pick(alias::ANSWER_TIME),
            end_time: pick(alias::END_TIME),
            conversation_time: pick(alias::CONVERSATION_TIME),
            waiting_time: pick(alias::WAITING_TIME),
            status: pick(alias::STATUS),
            direction: pick(alias::DIRECTION),
            destination: pick(alias::DESTINATION),
            operator: pick(alias::OPERATOR),
        })
    }
}
