mod analysis;
pub mod breakdown;
mod histogram;
mod summary;

pub use analysis::{analyze, Analysis, Warning};
pub use histogram::{fmt_secs, Bucket, BucketError, Histogram};
pub use summary::{
    second_attempt_stats, summarize_episodes, RecoverySummary, SecondAttemptStats,
};
