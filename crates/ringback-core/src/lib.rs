pub mod config;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod parse;
pub mod schema;
pub mod types;

pub use config::{EngineConfig, RecoveryPolicy};
pub use error::{ConfigError, NormalizeError, RowError, RowErrorKind};
pub use filter::RecordFilter;
pub use normalize::{normalize, NormalizeOptions, Normalized, RawRow};
pub use schema::{ColumnMap, Schema};
pub use types::*;
