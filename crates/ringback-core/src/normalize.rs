use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{NormalizeError, RowError, RowErrorKind};
use crate::parse::{
    cell_text, parse_direction, parse_duration_secs, parse_status, parse_timestamp,
};
use crate::schema::{ColumnMap, Schema};
use crate::types::{CallRecord, CallStatus, CallerId, Direction, Timestamp};

/// One untyped source row: column name → cell value.
pub type RawRow = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Abort the batch when more than this fraction of rows is rejected.
    pub max_error_fraction: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_error_fraction: 1.0,
        }
    }
}

/// Valid records plus per-row diagnostics for the rows that were dropped.
#[derive(Debug, Clone, Serialize)]
pub struct Normalized {
    pub schema: Schema,
    pub total_rows: usize,
    pub records: Vec<CallRecord>,
    pub errors: Vec<RowError>,
}

impl Normalized {
    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// Type raw rows into [`CallRecord`]s.
///
/// Structural problems (no rows, unknown schema) fail the whole batch.
/// Bad cells reject only their row; those rows are reported in
/// [`Normalized::errors`] in row order.
pub fn normalize(rows: &[RawRow], opts: &NormalizeOptions) -> Result<Normalized, NormalizeError> {
    if rows.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }

    let columns: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
    let map = ColumnMap::resolve(&columns)?;
    tracing::debug!(schema = ?map.schema, rows = rows.len(), "resolved input schema");

    let mut records = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match normalize_row(idx, row, &map) {
            Ok(rec) => records.push(rec),
            Err(e) => {
                tracing::debug!(row = idx, error = %e, "row rejected");
                errors.push(e);
            }
        }
    }

    let total = rows.len();
    if !errors.is_empty() {
        tracing::warn!(rejected = errors.len(), total, "rows rejected during normalization");
    }
    if errors.len() as f64 / total as f64 > opts.max_error_fraction {
        return Err(NormalizeError::TooManyRejected {
            rejected: errors.len(),
            total,
            max_fraction: opts.max_error_fraction,
        });
    }

    Ok(Normalized {
        schema: map.schema,
        total_rows: total,
        records,
        errors,
    })
}

fn cell<'a>(row: &'a RawRow, col: Option<&str>) -> &'a Value {
    col.and_then(|c| row.get(c)).unwrap_or(&Value::Null)
}

fn timestamp_field(
    row_idx: usize,
    row: &RawRow,
    col: Option<&str>,
    field: &'static str,
) -> Result<Option<Timestamp>, RowError> {
    parse_timestamp(cell(row, col)).map_err(|kind| RowError {
        row: row_idx,
        field,
        kind,
    })
}

fn duration_field(
    row_idx: usize,
    row: &RawRow,
    col: Option<&str>,
    field: &'static str,
) -> Result<Option<u64>, RowError> {
    parse_duration_secs(cell(row, col)).map_err(|kind| RowError {
        row: row_idx,
        field,
        kind,
    })
}

fn elapsed_secs(from: Timestamp, to: Timestamp) -> u64 {
    (to - from).whole_seconds().max(0) as u64
}

fn normalize_row(idx: usize, row: &RawRow, map: &ColumnMap) -> Result<CallRecord, RowError> {
    let start_time = timestamp_field(idx, row, Some(map.start_time), "start_time")?.ok_or(
        RowError {
            row: idx,
            field: "start_time",
            kind: RowErrorKind::Missing,
        },
    )?;
    let answer_time = timestamp_field(idx, row, map.answer_time, "answer_time")?;
    let end_time = timestamp_field(idx, row, map.end_time, "end_time")?;

    let direction = match cell_text(cell(row, map.direction)) {
        Some(text) => parse_direction(&text).map_err(|kind| RowError {
            row: idx,
            field: "direction",
            kind,
        })?,
        None => Direction::Inbound,
    };

    let status = match (map.status, cell_text(cell(row, map.status))) {
        (Some(_), Some(text)) => {
            let status = parse_status(&text);
            let disagrees = matches!(
                (status, answer_time.is_some()),
                (CallStatus::Served, false) | (CallStatus::NotServed, true)
            );
            if disagrees {
                tracing::debug!(row = idx, status = %text, "status disagrees with answer time");
            }
            status
        }
        _ if answer_time.is_some() => CallStatus::Served,
        _ => CallStatus::NotServed,
    };

    let conversation_secs = match answer_time {
        Some(_) => duration_field(idx, row, map.conversation_time, "conversation_time")?
            .unwrap_or(0),
        None => 0,
    };

    let waiting_secs = match duration_field(idx, row, map.waiting_time, "waiting_time")? {
        Some(w) => w,
        None => match (answer_time, end_time) {
            (Some(answered), _) => elapsed_secs(start_time, answered),
            (None, Some(ended)) => elapsed_secs(start_time, ended),
            (None, None) => 0,
        },
    };

    Ok(CallRecord {
        row: idx,
        caller_id: cell_text(cell(row, Some(map.caller_id))).and_then(CallerId::new),
        direction,
        start_time,
        answer_time,
        end_time,
        status,
        conversation_secs,
        waiting_secs,
        destination: cell_text(cell(row, map.destination)),
        operator: cell_text(cell(row, map.operator)),
    })
}
