use serde::Serialize;
use thiserror::Error;

/// Whole-batch failures. Processing stops when one of these is returned.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("input contains no rows")]
    EmptyInput,

    #[error("unrecognized schema: no column for `{field}` (tried {tried:?}; columns seen: {seen:?})")]
    Schema {
        field: &'static str,
        tried: &'static [&'static str],
        seen: Vec<String>,
    },

    #[error("{rejected} of {total} rows rejected, above the allowed fraction {max_fraction}")]
    TooManyRejected {
        rejected: usize,
        total: usize,
        max_fraction: f64,
    },
}

/// A problem with one source row. The row is excluded; the batch continues.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("row {row}: {field}: {kind}")]
pub struct RowError {
    pub row: usize,
    pub field: &'static str,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowErrorKind {
    #[error("missing required value")]
    Missing,

    #[error("unparsable timestamp {value:?}")]
    BadTimestamp { value: String },

    #[error("unparsable duration {value:?}")]
    BadDuration { value: String },

    #[error("negative duration {value}")]
    NegativeDuration { value: String },

    #[error("unrecognized direction {value:?}")]
    BadDirection { value: String },

    #[error("unsupported value type {value}")]
    BadType { value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
