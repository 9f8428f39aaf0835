use ringback_aggregate::fmt_secs;
use ringback_core::{CallRecord, CallerId, EngineConfig};
use ringback_derive::{
    build_timelines, classify_all, classify_all_parallel, Episode, EpisodeMode, Outcome,
};

use crate::display::fmt_ts;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    /// Only each caller's first missed call
    FirstMiss,
    /// Every missed call not absorbed by an earlier recovery
    PerOccurrence,
}

impl From<ModeArg> for EpisodeMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::FirstMiss => EpisodeMode::FirstMiss,
            ModeArg::PerOccurrence => EpisodeMode::PerOccurrence,
        }
    }
}

/// `ringback episodes <file>`: one line per missed-call episode.
///
/// The caller filter is applied after classification so the observation
/// horizon still comes from the whole dataset.
pub fn execute(
    records: &[CallRecord],
    cfg: &EngineConfig,
    mode: EpisodeMode,
    caller: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let timelines = build_timelines(records);
    let policy = cfg.policy();
    let episodes = if cfg.parallel {
        classify_all_parallel(&timelines, mode, &policy)
    } else {
        classify_all(&timelines, mode, &policy)
    };

    let wanted = caller.and_then(CallerId::new);
    let matched: Vec<&Episode> = episodes
        .iter()
        .filter(|ep| wanted.as_ref().map_or(true, |c| &ep.caller_id == c))
        .collect();

    if matched.is_empty() {
        println!("No {} episodes.", mode.label());
        return Ok(());
    }

    if json {
        for ep in &matched {
            println!("{}", serde_json::to_string(ep)?);
        }
    } else {
        for ep in &matched {
            println!("{}", episode_line(ep));
        }
        println!("\n({} episodes shown)", matched.len());
    }
    Ok(())
}

fn episode_line(ep: &Episode) -> String {
    let mut line = format!(
        "{:<16} {}  {:<9}",
        ep.caller_id.as_str(),
        fmt_ts(ep.anchor_at),
        ep.outcome.label()
    );
    if let Outcome::Recovered { at, after_secs, .. } = ep.outcome {
        line.push_str(&format!(
            " at {} (+{})",
            fmt_ts(at),
            fmt_secs(after_secs.max(0) as u64)
        ));
    }
    if ep.absorbed_misses > 0 {
        line.push_str(&format!(", {} more missed before", ep.absorbed_misses));
    }
    line
}
