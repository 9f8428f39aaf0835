//! Cell-level parsing for untyped spreadsheet values.
//!
//! Every helper treats JSON `null` and blank strings as "absent" and
//! returns `Ok(None)` for them.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::RowErrorKind;
use crate::types::{CallStatus, Direction, Timestamp};

const NAIVE_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[day]/[month]/[year] [hour]:[minute]:[second]"),
    format_description!("[day]/[month]/[year] [hour]:[minute]"),
];

const DATE_ONLY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Text content of a cell, `None` for null/blank. Numbers and booleans are
/// rendered to their JSON text.
pub fn cell_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a timestamp cell into a naive instant.
///
/// Zoned inputs (RFC 3339) are shifted to UTC before the offset is dropped.
pub fn parse_timestamp(v: &Value) -> Result<Option<Timestamp>, RowErrorKind> {
    let s = match v {
        Value::Null => return Ok(None),
        Value::String(s) => s.trim(),
        other => {
            return Err(RowErrorKind::BadType {
                value: other.to_string(),
            })
        }
    };
    if s.is_empty() {
        return Ok(None);
    }
    parse_timestamp_str(s)
        .map(Some)
        .ok_or_else(|| RowErrorKind::BadTimestamp {
            value: s.to_string(),
        })
}

pub fn parse_timestamp_str(s: &str) -> Option<Timestamp> {
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = PrimitiveDateTime::parse(s, fmt) {
            return Some(ts);
        }
    }
    // "2024-01-01 10:00:00+01:00" is common in sheet exports; RFC 3339 wants the `T`.
    let zoned = OffsetDateTime::parse(s, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&s.replacen(' ', "T", 1), &Rfc3339));
    if let Ok(odt) = zoned {
        let utc = odt.to_offset(UtcOffset::UTC);
        return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
    }
    time::Date::parse(s, DATE_ONLY)
        .ok()
        .map(|d| d.midnight())
}

/// Parse a duration cell into whole seconds.
///
/// Accepts numbers, numeric strings, and `HH:MM:SS` / `MM:SS` text.
pub fn parse_duration_secs(v: &Value) -> Result<Option<u64>, RowErrorKind> {
    let secs = match v {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64().ok_or_else(|| RowErrorKind::BadDuration {
            value: n.to_string(),
        })?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            parse_duration_str(s).ok_or_else(|| RowErrorKind::BadDuration {
                value: s.to_string(),
            })?
        }
        other => {
            return Err(RowErrorKind::BadType {
                value: other.to_string(),
            })
        }
    };
    if !secs.is_finite() {
        return Err(RowErrorKind::BadDuration {
            value: secs.to_string(),
        });
    }
    if secs < 0.0 {
        return Err(RowErrorKind::NegativeDuration {
            value: secs.to_string(),
        });
    }
    Ok(Some(secs.round() as u64))
}

fn parse_duration_str(s: &str) -> Option<f64> {
    if let Ok(n) = s.parse::<f64>() {
        return Some(n);
    }
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let mut total = 0.0;
    for p in &parts {
        let n: f64 = p.trim().parse().ok()?;
        if n < 0.0 {
            return None;
        }
        total = total * 60.0 + n;
    }
    Some(total)
}

/// Map free-text status to the display enum.
pub fn parse_status(text: &str) -> CallStatus {
    let t = text.trim().to_lowercase().replace(['_', '-'], " ");
    match t.as_str() {
        "served" | "answered" | "servita" | "risposta" => CallStatus::Served,
        "not served" | "unanswered" | "missed" | "abandoned" | "non servita" | "persa"
        | "non risposta" => CallStatus::NotServed,
        _ => CallStatus::Other,
    }
}

pub fn parse_direction(text: &str) -> Result<Direction, RowErrorKind> {
    match text.trim().to_lowercase().as_str() {
        "inbound" | "in" | "incoming" | "entrante" => Ok(Direction::Inbound),
        "outbound" | "out" | "outgoing" | "uscente" => Ok(Direction::Outbound),
        _ => Err(RowErrorKind::BadDirection {
            value: text.to_string(),
        }),
    }
}
