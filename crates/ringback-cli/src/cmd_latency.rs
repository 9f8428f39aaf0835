use ringback_aggregate::{analyze, Analysis, Bucket, Histogram};
use ringback_core::{CallRecord, EngineConfig};
use ringback_derive::{AttemptGap, RecoveryLatency};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct LatencyReport<'a> {
    attempt_gap_histogram: &'a Histogram,
    recovery_latency_histogram: &'a Histogram,
    attempt_gaps: &'a [AttemptGap],
    recovery_latencies: &'a [RecoveryLatency],
}

impl<'a> From<&'a Analysis> for LatencyReport<'a> {
    fn from(a: &'a Analysis) -> Self {
        Self {
            attempt_gap_histogram: &a.attempt_gap_histogram,
            recovery_latency_histogram: &a.recovery_latency_histogram,
            attempt_gaps: &a.attempt_gaps,
            recovery_latencies: &a.recovery_latencies,
        }
    }
}

/// `ringback latency <file>`: gap-to-answer and time-to-recovery histograms.
pub fn execute(records: &[CallRecord], cfg: &EngineConfig, json: bool) -> anyhow::Result<()> {
    let analysis = analyze(records, cfg)?;
    let report = LatencyReport::from(&analysis);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn render(report: &LatencyReport<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Served calls after an earlier attempt, by time since that attempt ({}):",
        report.attempt_gap_histogram.total()
    );
    write_buckets(&mut out, &report.attempt_gap_histogram.buckets());
    let _ = writeln!(
        out,
        "\nRecovered missed calls, by time to the served call ({}):",
        report.recovery_latency_histogram.total()
    );
    write_buckets(&mut out, &report.recovery_latency_histogram.buckets());
    out
}

fn write_buckets(out: &mut String, buckets: &[Bucket]) {
    let widest = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    for b in buckets {
        let bar = if widest == 0 {
            0
        } else {
            (b.count * 40).div_ceil(widest) as usize
        };
        let _ = writeln!(out, "  {:<10} {:>6}  {}", b.label, b.count, "#".repeat(bar));
    }
}
