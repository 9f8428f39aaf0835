//! Descriptive reductions over the filtered record set. Independent of the
//! classifier; category order is fixed (hours 0-23, Monday first, calendar
//! days ascending).

use ringback_core::CallRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use time::{Date, Weekday};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_calls: usize,
    pub inbound: usize,
    pub outbound: usize,
    pub served: usize,
    pub not_served: usize,
    pub anonymous: usize,
    pub distinct_callers: usize,
    pub distinct_operators: usize,
    pub total_conversation_secs: u64,
}

pub fn overview(records: &[CallRecord]) -> Overview {
    let mut out = Overview {
        total_calls: records.len(),
        ..Default::default()
    };
    let mut callers = BTreeSet::new();
    let mut operators = BTreeSet::new();
    for rec in records {
        if rec.is_inbound() {
            out.inbound += 1;
        } else {
            out.outbound += 1;
        }
        if rec.is_served() {
            out.served += 1;
        } else {
            out.not_served += 1;
        }
        match &rec.caller_id {
            Some(c) => {
                callers.insert(c);
            }
            None => out.anonymous += 1,
        }
        if let Some(op) = &rec.operator {
            operators.insert(op.as_str());
        }
        out.total_conversation_secs += rec.conversation_secs;
    }
    out.distinct_callers = callers.len();
    out.distinct_operators = operators.len();
    out
}

/// Call volume in one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub calls: usize,
    pub served: usize,
    /// Mean waiting time over all calls in the category.
    pub mean_waiting_secs: Option<f64>,
    #[serde(skip)]
    waiting_total: u64,
}

impl Tally {
    fn add(&mut self, rec: &CallRecord) {
        self.calls += 1;
        if rec.is_served() {
            self.served += 1;
        }
        self.waiting_total += rec.waiting_secs;
        self.mean_waiting_secs = Some(self.waiting_total as f64 / self.calls as f64);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourRow {
    pub hour: u8,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayRow {
    pub weekday: &'static str,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationRow {
    pub destination: String,
    #[serde(flatten)]
    pub tally: Tally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub date: Date,
    #[serde(flatten)]
    pub tally: Tally,
}

/// All 24 hours, including empty ones.
pub fn by_hour(records: &[CallRecord]) -> Vec<HourRow> {
    let mut rows: Vec<HourRow> = (0..24u8)
        .map(|hour| HourRow {
            hour,
            tally: Tally::default(),
        })
        .collect();
    for rec in records {
        rows[rec.start_time.hour() as usize].tally.add(rec);
    }
    rows
}

const WEEK: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "monday",
        Weekday::Tuesday => "tuesday",
        Weekday::Wednesday => "wednesday",
        Weekday::Thursday => "thursday",
        Weekday::Friday => "friday",
        Weekday::Saturday => "saturday",
        Weekday::Sunday => "sunday",
    }
}

/// All seven weekdays, Monday first.
pub fn by_weekday(records: &[CallRecord]) -> Vec<WeekdayRow> {
    let mut rows: Vec<WeekdayRow> = WEEK
        .iter()
        .map(|&d| WeekdayRow {
            weekday: weekday_name(d),
            tally: Tally::default(),
        })
        .collect();
    for rec in records {
        let idx = rec.start_time.weekday().number_days_from_monday() as usize;
        rows[idx].tally.add(rec);
    }
    rows
}

/// Busiest destination first; ties by name. Records without a destination
/// are not counted here.
pub fn by_destination(records: &[CallRecord]) -> Vec<DestinationRow> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for rec in records {
        if let Some(dest) = &rec.destination {
            tallies.entry(dest.as_str()).or_default().add(rec);
        }
    }
    let mut rows: Vec<DestinationRow> = tallies
        .into_iter()
        .map(|(d, tally)| DestinationRow {
            destination: d.to_string(),
            tally,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.tally
            .calls
            .cmp(&a.tally.calls)
            .then_with(|| a.destination.cmp(&b.destination))
    });
    rows
}

/// Days with at least one call, in calendar order.
pub fn by_day(records: &[CallRecord]) -> Vec<DayRow> {
    let mut days: BTreeMap<Date, Tally> = BTreeMap::new();
    for rec in records {
        days.entry(rec.start_time.date()).or_default().add(rec);
    }
    days.into_iter()
        .map(|(date, tally)| DayRow { date, tally })
        .collect()
}
