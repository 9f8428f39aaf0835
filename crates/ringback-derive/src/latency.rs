use ringback_core::{CallerId, Timestamp};
use serde::Serialize;
use std::collections::HashMap;

use crate::episode::{Episode, Outcome};
use crate::timeline::Timelines;

/// A served call and the gap since the caller's previous attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptGap {
    pub caller_id: CallerId,
    pub row: usize,
    pub at: Timestamp,
    /// 1-based position in the caller's timeline; always ≥ 2.
    pub attempt: usize,
    pub since_previous_secs: i64,
    pub previous_served: bool,
    /// Elapsed since the anchor of the missed-call episode this call
    /// resolved, when it resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_missed_secs: Option<i64>,
}

/// Time from a missed call to the served call that recovered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveryLatency {
    pub caller_id: CallerId,
    pub anchor_at: Timestamp,
    pub recovered_at: Timestamp,
    pub elapsed_secs: i64,
}

/// Gaps for every served call that has a predecessor.
///
/// `episodes` should be the per-occurrence set; it is used only to fill
/// [`AttemptGap::since_missed_secs`]. A caller's first call never yields
/// a gap.
pub fn extract_attempt_gaps(timelines: &Timelines, episodes: &[Episode]) -> Vec<AttemptGap> {
    let resolving: HashMap<(&CallerId, usize), i64> = episodes
        .iter()
        .filter_map(|ep| match ep.outcome {
            Outcome::Recovered {
                row, after_secs, ..
            } => Some(((&ep.caller_id, row), after_secs)),
            _ => None,
        })
        .collect();

    let mut gaps = Vec::new();
    for tl in timelines.iter() {
        for (idx, pair) in tl.records().windows(2).enumerate() {
            let (prev, cur) = (&pair[0], &pair[1]);
            if !cur.is_served() {
                continue;
            }
            gaps.push(AttemptGap {
                caller_id: tl.caller_id().clone(),
                row: cur.row,
                at: cur.start_time,
                attempt: idx + 2,
                since_previous_secs: (cur.start_time - prev.start_time).whole_seconds(),
                previous_served: prev.is_served(),
                since_missed_secs: resolving.get(&(tl.caller_id(), cur.row)).copied(),
            });
        }
    }
    gaps
}

/// Recovery latency for every recovered episode, in episode order.
pub fn extract_recovery_latencies(episodes: &[Episode]) -> Vec<RecoveryLatency> {
    episodes
        .iter()
        .filter_map(|ep| match ep.outcome {
            Outcome::Recovered { at, after_secs, .. } => Some(RecoveryLatency {
                caller_id: ep.caller_id.clone(),
                anchor_at: ep.anchor_at,
                recovered_at: at,
                elapsed_secs: after_secs,
            }),
            _ => None,
        })
        .collect()
}
