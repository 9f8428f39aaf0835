use ringback_core::{CallRecord, CallerId, Timestamp};
use std::collections::BTreeMap;

/// One caller's inbound attempts in timeline order.
///
/// Ordered ascending by `start_time`; equal start times keep their source
/// order. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerTimeline {
    caller_id: CallerId,
    records: Vec<CallRecord>,
}

impl CallerTimeline {
    pub fn caller_id(&self) -> &CallerId {
        &self.caller_id
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-caller timelines for one dataset.
#[derive(Debug, Clone, Default)]
pub struct Timelines {
    by_caller: BTreeMap<CallerId, CallerTimeline>,
    observed_until: Option<Timestamp>,
    pub skipped_outbound: usize,
    pub skipped_anonymous: usize,
}

impl Timelines {
    pub fn get(&self, caller: &CallerId) -> Option<&CallerTimeline> {
        self.by_caller.get(caller)
    }

    /// Timelines ordered by caller id.
    pub fn iter(&self) -> impl Iterator<Item = &CallerTimeline> {
        self.by_caller.values()
    }

    pub fn len(&self) -> usize {
        self.by_caller.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_caller.is_empty()
    }

    /// Latest `start_time` anywhere in the dataset, any direction or caller.
    /// Observation windows ending after this instant are not yet elapsed.
    pub fn observed_until(&self) -> Option<Timestamp> {
        self.observed_until
    }
}

/// Group records into per-caller inbound timelines.
///
/// Outbound records and records without a caller identity are counted and
/// skipped, but still extend [`Timelines::observed_until`].
pub fn build_timelines(records: &[CallRecord]) -> Timelines {
    let mut out = Timelines::default();
    let mut grouped: BTreeMap<CallerId, Vec<CallRecord>> = BTreeMap::new();

    for rec in records {
        out.observed_until = Some(match out.observed_until {
            Some(t) => t.max(rec.start_time),
            None => rec.start_time,
        });
        if !rec.is_inbound() {
            out.skipped_outbound += 1;
            continue;
        }
        let Some(caller) = &rec.caller_id else {
            out.skipped_anonymous += 1;
            continue;
        };
        grouped.entry(caller.clone()).or_default().push(rec.clone());
    }

    for (caller_id, mut recs) in grouped {
        // stable: ties keep source order
        recs.sort_by_key(|r| r.start_time);
        out.by_caller.insert(
            caller_id.clone(),
            CallerTimeline {
                caller_id,
                records: recs,
            },
        );
    }

    tracing::debug!(
        callers = out.by_caller.len(),
        skipped_outbound = out.skipped_outbound,
        skipped_anonymous = out.skipped_anonymous,
        "built caller timelines"
    );
    out
}
