use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::normalize::NormalizeOptions;

/// Upper bound for either classifier window: one hundred years.
pub const MAX_WINDOW_DAYS: i64 = 36_525;

/// Engine settings, loaded from JSON. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A missed call is recovered by a served call within this many hours.
    pub recovery_window_hours: i64,
    /// A missed call is lost after this many silent days.
    pub loss_window_days: i64,
    /// See [`NormalizeOptions::max_error_fraction`].
    pub max_error_fraction: f64,
    /// Histogram boundaries, in minutes, for latency distributions.
    pub latency_buckets_minutes: Vec<u64>,
    /// Classify callers on the rayon thread pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recovery_window_hours: 48,
            loss_window_days: 7,
            max_error_fraction: 1.0,
            latency_buckets_minutes: vec![0, 5, 15, 30, 60, 120, 240, 480, 1440, 2880],
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg: EngineConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recovery_window_hours <= 0 {
            return Err(ConfigError::Invalid(
                "recovery_window_hours must be positive".into(),
            ));
        }
        if self.loss_window_days <= 0 {
            return Err(ConfigError::Invalid("loss_window_days must be positive".into()));
        }
        if self.recovery_window_hours > MAX_WINDOW_DAYS * 24
            || self.loss_window_days > MAX_WINDOW_DAYS
        {
            return Err(ConfigError::Invalid(format!(
                "windows must not exceed {MAX_WINDOW_DAYS} days"
            )));
        }
        if self.loss_window_days * 24 < self.recovery_window_hours {
            return Err(ConfigError::Invalid(
                "loss window must not be shorter than the recovery window".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_error_fraction) {
            return Err(ConfigError::Invalid(
                "max_error_fraction must be within [0, 1]".into(),
            ));
        }
        if self.latency_buckets_minutes.first() != Some(&0)
            || self.latency_buckets_minutes.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(ConfigError::Invalid(
                "latency_buckets_minutes must start at 0 and strictly increase".into(),
            ));
        }
        Ok(())
    }

    /// Windows as durations. Out-of-range values saturate instead of
    /// panicking; [`EngineConfig::validate`] rejects them up front.
    pub fn policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            recovery_window: time::Duration::seconds(
                self.recovery_window_hours.saturating_mul(3_600),
            ),
            loss_window: time::Duration::seconds(self.loss_window_days.saturating_mul(86_400)),
        }
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            max_error_fraction: self.max_error_fraction,
        }
    }
}

/// Time windows applied by the recovery classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    pub recovery_window: time::Duration,
    pub loss_window: time::Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        EngineConfig::default().policy()
    }
}
