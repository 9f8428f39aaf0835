use ringback_core::{CallRecord, EngineConfig, RecoveryPolicy, Timestamp};
use ringback_derive::{
    build_timelines, classify_all, classify_all_parallel, extract_attempt_gaps,
    extract_recovery_latencies, AttemptGap, Episode, EpisodeMode, RecoveryLatency, Timelines,
};
use serde::Serialize;

use crate::breakdown::{self, DayRow, DestinationRow, HourRow, Overview, WeekdayRow};
use crate::histogram::{BucketError, Histogram};
use crate::summary::{second_attempt_stats, summarize_episodes, RecoverySummary, SecondAttemptStats};

/// Conditions worth surfacing that are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// No inbound call with a caller identity survived filtering.
    EmptyTimeline,
}

/// Everything one engine run produces for a record set.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub observed_until: Option<Timestamp>,
    /// One outcome per caller: the headline recovery metric.
    pub headline: RecoverySummary,
    pub per_occurrence: RecoverySummary,
    pub second_attempt: SecondAttemptStats,
    pub overview: Overview,
    pub by_hour: Vec<HourRow>,
    pub by_weekday: Vec<WeekdayRow>,
    pub by_destination: Vec<DestinationRow>,
    pub by_day: Vec<DayRow>,
    pub attempt_gap_histogram: Histogram,
    pub recovery_latency_histogram: Histogram,
    pub warnings: Vec<Warning>,
    #[serde(skip)]
    pub timelines: Timelines,
    #[serde(skip)]
    pub first_miss_episodes: Vec<Episode>,
    #[serde(skip)]
    pub per_occurrence_episodes: Vec<Episode>,
    #[serde(skip)]
    pub attempt_gaps: Vec<AttemptGap>,
    #[serde(skip)]
    pub recovery_latencies: Vec<RecoveryLatency>,
}

/// Run timelines, both classifier modes, latency extraction and every
/// aggregate over `records`.
///
/// `records` is the host's already-filtered dataset; nothing is cached
/// between calls.
pub fn analyze(records: &[CallRecord], cfg: &EngineConfig) -> Result<Analysis, BucketError> {
    let policy = cfg.policy();
    let timelines = build_timelines(records);

    let mut warnings = Vec::new();
    if timelines.is_empty() {
        tracing::warn!(records = records.len(), "no inbound caller timelines to classify");
        warnings.push(Warning::EmptyTimeline);
    }

    let classify: fn(&Timelines, EpisodeMode, &RecoveryPolicy) -> Vec<Episode> = if cfg.parallel {
        classify_all_parallel
    } else {
        classify_all
    };
    let first_miss_episodes = classify(&timelines, EpisodeMode::FirstMiss, &policy);
    let per_occurrence_episodes = classify(&timelines, EpisodeMode::PerOccurrence, &policy);

    let attempt_gaps = extract_attempt_gaps(&timelines, &per_occurrence_episodes);
    let recovery_latencies = extract_recovery_latencies(&per_occurrence_episodes);

    let mut attempt_gap_histogram = Histogram::from_minutes(&cfg.latency_buckets_minutes)?;
    attempt_gap_histogram.extend_secs(attempt_gaps.iter().map(|g| g.since_previous_secs));
    let mut recovery_latency_histogram = Histogram::from_minutes(&cfg.latency_buckets_minutes)?;
    recovery_latency_histogram.extend_secs(recovery_latencies.iter().map(|l| l.elapsed_secs));

    let headline = summarize_episodes(EpisodeMode::FirstMiss, &first_miss_episodes);
    tracing::debug!(
        recovered = headline.recovered,
        lost = headline.lost,
        pending = headline.pending,
        "headline recovery summary"
    );

    Ok(Analysis {
        observed_until: timelines.observed_until(),
        per_occurrence: summarize_episodes(EpisodeMode::PerOccurrence, &per_occurrence_episodes),
        headline,
        second_attempt: second_attempt_stats(&timelines),
        overview: breakdown::overview(records),
        by_hour: breakdown::by_hour(records),
        by_weekday: breakdown::by_weekday(records),
        by_destination: breakdown::by_destination(records),
        by_day: breakdown::by_day(records),
        attempt_gap_histogram,
        recovery_latency_histogram,
        warnings,
        timelines,
        first_miss_episodes,
        per_occurrence_episodes,
        attempt_gaps,
        recovery_latencies,
    })
}
