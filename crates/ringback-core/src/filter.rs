use time::Date;

use crate::types::CallRecord;

/// Date-range and destination filter, applied by the host before analysis.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Inclusive lower bound on `start_time`'s date.
    pub from: Option<Date>,
    /// Inclusive upper bound on `start_time`'s date.
    pub to: Option<Date>,
    /// Keep only these destinations. Empty means all.
    pub destinations: Vec<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.destinations.is_empty()
    }

    pub fn matches(&self, rec: &CallRecord) -> bool {
        let day = rec.start_time.date();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        if !self.destinations.is_empty() {
            match &rec.destination {
                Some(d) if self.destinations.iter().any(|want| want == d) => {}
                _ => return false,
            }
        }
        true
    }

    /// Records passing the filter, in their original order.
    pub fn apply(&self, records: &[CallRecord]) -> Vec<CallRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}
