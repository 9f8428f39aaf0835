use ringback_aggregate::{analyze, Analysis, RecoverySummary};
use ringback_core::{CallRecord, EngineConfig};
use std::fmt::Write;

use crate::display::{fmt_ts, pct};

/// `ringback report <file>`: headline recovery plus descriptive breakdowns.
pub fn execute(records: &[CallRecord], cfg: &EngineConfig, json: bool) -> anyhow::Result<()> {
    let analysis = analyze(records, cfg)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render(&analysis, cfg));
    }
    Ok(())
}

fn render(a: &Analysis, cfg: &EngineConfig) -> String {
    let mut out = String::new();
    let o = &a.overview;

    // ── Overview ──
    let _ = writeln!(
        out,
        "Calls: {} ({} inbound, {} outbound), {} served, {} not served",
        o.total_calls, o.inbound, o.outbound, o.served, o.not_served
    );
    let _ = writeln!(
        out,
        "Callers: {} distinct, {} anonymous calls; operators: {}",
        o.distinct_callers, o.anonymous, o.distinct_operators
    );
    let _ = writeln!(
        out,
        "Talk time: {}",
        ringback_aggregate::fmt_secs(o.total_conversation_secs)
    );
    match a.observed_until {
        Some(ts) => {
            let _ = writeln!(out, "Data observed until: {}", fmt_ts(ts));
        }
        None => {
            let _ = writeln!(out, "No inbound caller timelines; nothing to classify.");
        }
    }

    // ── Recovery ──
    let _ = writeln!(
        out,
        "\nRecovery (within {}h, lost after {}d without contact)",
        cfg.recovery_window_hours, cfg.loss_window_days
    );
    write_summary(&mut out, "first missed call per caller", &a.headline);
    write_summary(&mut out, "every missed call", &a.per_occurrence);

    let s = &a.second_attempt;
    let _ = writeln!(
        out,
        "\nAnswered on second attempt: {} of {} callers with 2+ calls ({}); {} missed the first",
        s.answered_on_second,
        s.eligible_callers,
        pct(s.rate),
        s.first_missed
    );

    // ── Breakdowns ──
    let _ = writeln!(out, "\nBy hour:");
    for row in a.by_hour.iter().filter(|r| r.tally.calls > 0) {
        let _ = writeln!(
            out,
            "  {:02}:00  {:>6} calls  {:>6} served",
            row.hour, row.tally.calls, row.tally.served
        );
    }
    let _ = writeln!(out, "\nBy weekday:");
    for row in &a.by_weekday {
        let _ = writeln!(
            out,
            "  {:<10} {:>6} calls  {:>6} served",
            row.weekday, row.tally.calls, row.tally.served
        );
    }
    if !a.by_destination.is_empty() {
        let _ = writeln!(out, "\nBy destination:");
        for row in &a.by_destination {
            let _ = writeln!(
                out,
                "  {:<24} {:>6} calls  {:>6} served",
                row.destination, row.tally.calls, row.tally.served
            );
        }
    }
    out
}

fn write_summary(out: &mut String, title: &str, s: &RecoverySummary) {
    let _ = writeln!(out, "  {title} ({} episodes):", s.total());
    let _ = writeln!(out, "    recovered {:>6}  {}", s.recovered, pct(s.recovery_rate()));
    let _ = writeln!(out, "    lost      {:>6}  {}", s.lost, pct(s.loss_rate()));
    let _ = writeln!(out, "    pending   {:>6}  {}", s.pending, pct(s.pending_rate()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::call;
    use time::macros::datetime;

    #[test]
    fn text_report_shows_pending_next_to_rates() {
        let recs = [
            call(0, "555", datetime!(2024-01-01 10:00), false),
            call(1, "555", datetime!(2024-01-02 09:00), true),
            call(2, "777", datetime!(2024-01-03 11:00), false),
        ];
        let cfg = EngineConfig::default();
        let text = render(&analyze(&recs, &cfg).unwrap(), &cfg);
        assert!(text.contains("Calls: 3 (3 inbound, 0 outbound), 1 served, 2 not served"));
        assert!(text.contains("within 48h"));
        assert!(text.contains("recovered      1  50.0%"));
        assert!(text.contains("pending        1  50.0%"));
        assert!(text.contains("Data observed until: 2024-01-03 11:00"));
    }

    #[test]
    fn empty_input_reports_no_timelines() {
        let cfg = EngineConfig::default();
        let text = render(&analyze(&[], &cfg).unwrap(), &cfg);
        assert!(text.contains("nothing to classify"));
        assert!(text.contains("recovered      0  n/a"));
    }
}
