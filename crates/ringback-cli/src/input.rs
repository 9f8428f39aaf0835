use anyhow::Context;
use ringback_core::{normalize, CallRecord, EngineConfig, RawRow, RecordFilter};
use std::path::Path;
use time::macros::format_description;
use time::Date;

// ── Filter flags ──

#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Keep calls starting on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<Date>,
    /// Keep calls starting on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<Date>,
    /// Keep only this destination (repeatable)
    #[arg(long = "dest")]
    pub destinations: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            from: self.from,
            to: self.to,
            destinations: self.destinations.clone(),
        }
    }
}

pub fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD, got {s:?}: {e}"))
}

// ── Config ──

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(p) => Ok(EngineConfig::load(p)?),
        None => Ok(EngineConfig::default()),
    }
}

// ── Rows ──

/// Parse a JSON array of row objects, or one object per line.
pub fn parse_rows(text: &str) -> anyhow::Result<Vec<RawRow>> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).context("input is not a JSON array of objects");
    }
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: RawRow =
            serde_json::from_str(line).with_context(|| format!("line {}: not a JSON object", i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_rows(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_rows(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Read, normalize and filter a call export.
///
/// Rejected rows are reported on stderr as a count; `verbose` lists them.
pub fn load_records(
    path: &Path,
    cfg: &EngineConfig,
    filter: &RecordFilter,
    verbose: bool,
) -> anyhow::Result<Vec<CallRecord>> {
    let rows = read_rows(path)?;
    let normalized = normalize(&rows, &cfg.normalize_options())
        .with_context(|| format!("normalizing {}", path.display()))?;

    if normalized.rejected() > 0 {
        eprintln!(
            "data quality: {} of {} rows rejected",
            normalized.rejected(),
            normalized.total_rows
        );
        if verbose {
            for err in &normalized.errors {
                eprintln!("  {err}");
            }
        }
    }

    let records = if filter.is_empty() {
        normalized.records
    } else {
        filter.apply(&normalized.records)
    };
    tracing::debug!(
        schema = ?normalized.schema,
        kept = records.len(),
        "records loaded"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use time::macros::date;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_array_and_lines() {
        let array = r#"[{"callerId":"1","startTime":"2024-01-01 10:00:00"}]"#;
        assert_eq!(parse_rows(array).unwrap().len(), 1);

        let lines = "{\"callerId\":\"1\"}\n\n{\"callerId\":\"2\"}\n";
        let rows = parse_rows(lines).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["callerId"], "2");
    }

    #[test]
    fn bad_line_is_reported_by_number() {
        let err = parse_rows("{\"a\":1}\nnot json\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn date_flag_format() {
        assert_eq!(parse_date("2024-03-05").unwrap(), date!(2024-03-05));
        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn missing_config_uses_defaults() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn load_normalizes_and_filters() {
        let f = write_tmp(
            r#"[
                {"callerId":"1","startTime":"2024-01-01 10:00:00","answerTime":null,"detailDestinationName":"Sales"},
                {"callerId":"1","startTime":"2024-01-02 09:00:00","answerTime":"2024-01-02 09:00:20","detailDestinationName":"Sales"},
                {"callerId":"2","startTime":"2024-01-03 09:00:00","answerTime":null,"detailDestinationName":"Support"},
                {"callerId":"3","startTime":"garbage"}
            ]"#,
        );
        let cfg = EngineConfig::default();

        let all = load_records(f.path(), &cfg, &RecordFilter::default(), false).unwrap();
        assert_eq!(all.len(), 3);

        let filter = FilterArgs {
            to: Some(date!(2024-01-02)),
            destinations: vec!["Sales".into()],
            ..Default::default()
        };
        let kept = load_records(f.path(), &cfg, &filter.to_filter(), false).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.destination.as_deref() == Some("Sales")));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_rows(Path::new("/nonexistent/calls.json")).unwrap_err();
        assert!(err.to_string().contains("calls.json"));
    }
}
