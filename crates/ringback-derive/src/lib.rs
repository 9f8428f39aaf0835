mod classify;
mod episode;
mod latency;
mod timeline;

pub use classify::{
    classify_all, classify_all_parallel, classify_first_miss, classify_per_occurrence,
};
pub use episode::{Episode, EpisodeMode, Outcome};
pub use latency::{extract_attempt_gaps, extract_recovery_latencies, AttemptGap, RecoveryLatency};
pub use timeline::{build_timelines, CallerTimeline, Timelines};
