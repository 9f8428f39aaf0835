use ringback_core::CallerId;
use ringback_derive::{Episode, EpisodeMode, Outcome, Timelines};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

// ── Recovery summary ──

/// Recovered / lost / pending counts for one episode mode.
///
/// Pending is always reported next to the rate: a date range that ends
/// recently leaves many episodes undetermined.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoverySummary {
    pub mode: EpisodeMode,
    pub recovered: usize,
    pub lost: usize,
    pub pending: usize,
    /// Per caller: whether any of their episodes was recovered.
    pub callers: BTreeMap<CallerId, bool>,
}

impl RecoverySummary {
    pub fn empty(mode: EpisodeMode) -> Self {
        Self {
            mode,
            recovered: 0,
            lost: 0,
            pending: 0,
            callers: BTreeMap::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.recovered + self.lost + self.pending
    }

    pub fn recovery_rate(&self) -> Option<f64> {
        ratio(self.recovered, self.total())
    }

    pub fn loss_rate(&self) -> Option<f64> {
        ratio(self.lost, self.total())
    }

    pub fn pending_rate(&self) -> Option<f64> {
        ratio(self.pending, self.total())
    }

    pub fn add(&mut self, episode: &Episode) {
        match episode.outcome {
            Outcome::Recovered { .. } => self.recovered += 1,
            Outcome::Lost => self.lost += 1,
            Outcome::Pending => self.pending += 1,
        }
        let seen = self.callers.entry(episode.caller_id.clone()).or_insert(false);
        *seen |= episode.outcome.is_recovered();
    }

    /// Combine two partial summaries. Order of merging does not matter.
    ///
    /// # Panics
    /// Panics if the two summaries were built for different modes.
    pub fn merge(mut self, other: RecoverySummary) -> Self {
        assert_eq!(self.mode, other.mode, "merging summaries of different modes");
        self.recovered += other.recovered;
        self.lost += other.lost;
        self.pending += other.pending;
        for (caller, recovered) in other.callers {
            *self.callers.entry(caller).or_insert(false) |= recovered;
        }
        self
    }
}

pub fn summarize_episodes(mode: EpisodeMode, episodes: &[Episode]) -> RecoverySummary {
    let mut summary = RecoverySummary::empty(mode);
    for ep in episodes {
        summary.add(ep);
    }
    summary
}

#[derive(Serialize)]
struct SummaryView<'a> {
    mode: EpisodeMode,
    recovered: usize,
    lost: usize,
    pending: usize,
    total: usize,
    recovery_rate: Option<f64>,
    loss_rate: Option<f64>,
    pending_rate: Option<f64>,
    callers: &'a BTreeMap<CallerId, bool>,
}

impl Serialize for RecoverySummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SummaryView {
            mode: self.mode,
            recovered: self.recovered,
            lost: self.lost,
            pending: self.pending,
            total: self.total(),
            recovery_rate: self.recovery_rate(),
            loss_rate: self.loss_rate(),
            pending_rate: self.pending_rate(),
            callers: &self.callers,
        }
        .serialize(serializer)
    }
}

// ── Answered on second attempt ──

/// Among callers with at least two inbound attempts, how many were missed
/// on the first and served on the second.
///
/// Narrower than the 48h recovery rate: it ignores timing and looks only at
/// attempts #1 and #2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondAttemptStats {
    pub eligible_callers: usize,
    pub first_missed: usize,
    pub answered_on_second: usize,
    pub rate: Option<f64>,
}

pub fn second_attempt_stats(timelines: &Timelines) -> SecondAttemptStats {
    let mut eligible = 0;
    let mut first_missed = 0;
    let mut answered = 0;
    for tl in timelines.iter() {
        let [first, second, ..] = tl.records() else {
            continue;
        };
        eligible += 1;
        if !first.is_served() {
            first_missed += 1;
            if second.is_served() {
                answered += 1;
            }
        }
    }
    SecondAttemptStats {
        eligible_callers: eligible,
        first_missed,
        answered_on_second: answered,
        rate: ratio(answered, eligible),
    }
}

pub(crate) fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}
