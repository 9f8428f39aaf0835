use rayon::prelude::*;
use ringback_core::{CallRecord, RecoveryPolicy, Timestamp};

use crate::episode::{Episode, EpisodeMode, Outcome};
use crate::timeline::{CallerTimeline, Timelines};

/// Resolution of the episode anchored at `records[anchor]`, plus the index of
/// the resolving record when recovered.
///
/// Only records strictly after the anchor instant count. Both windows are
/// closed at the top: a call at exactly `t0 + window` is inside. A window
/// whose end is past the last representable date never closes, so such an
/// episode can recover but is never lost.
fn resolve(
    records: &[CallRecord],
    anchor: usize,
    policy: &RecoveryPolicy,
    observed_until: Timestamp,
) -> (Outcome, Option<usize>) {
    let t0 = records[anchor].start_time;
    let recover_by = t0.checked_add(policy.recovery_window);
    let lose_by = t0.checked_add(policy.loss_window);
    let mut contacted = false;

    for (idx, rec) in records.iter().enumerate().skip(anchor + 1) {
        if rec.start_time <= t0 {
            continue;
        }
        if lose_by.is_some_and(|end| rec.start_time > end) {
            break;
        }
        contacted = true;
        if recover_by.is_some_and(|end| rec.start_time > end) {
            // further contact, but too late to count as a recovery
            break;
        }
        if rec.is_served() {
            let outcome = Outcome::Recovered {
                row: rec.row,
                at: rec.start_time,
                after_secs: (rec.start_time - t0).whole_seconds(),
            };
            return (outcome, Some(idx));
        }
    }

    let window_observed = lose_by.is_some_and(|end| observed_until >= end);
    if !contacted && window_observed {
        (Outcome::Lost, None)
    } else {
        (Outcome::Pending, None)
    }
}

fn episode(
    timeline: &CallerTimeline,
    anchor: usize,
    outcome: Outcome,
    absorbed_misses: usize,
) -> Episode {
    let rec = &timeline.records()[anchor];
    Episode {
        caller_id: timeline.caller_id().clone(),
        anchor_row: rec.row,
        anchor_at: rec.start_time,
        outcome,
        absorbed_misses,
    }
}

/// Classify the caller's first missed call. `None` when the caller was
/// never missed.
pub fn classify_first_miss(
    timeline: &CallerTimeline,
    policy: &RecoveryPolicy,
    observed_until: Timestamp,
) -> Option<Episode> {
    let records = timeline.records();
    let anchor = records.iter().position(|r| !r.is_served())?;
    let (outcome, resolved) = resolve(records, anchor, policy, observed_until);
    let absorbed = match resolved {
        Some(end) => count_misses(&records[anchor + 1..end]),
        None => 0,
    };
    Some(episode(timeline, anchor, outcome, absorbed))
}

/// Classify every missed call that is not already inside a recovered
/// episode.
///
/// Scanning resumes after the resolving call of a recovered episode; lost
/// and pending episodes cover only their anchor, so the next missed call
/// opens its own episode.
pub fn classify_per_occurrence(
    timeline: &CallerTimeline,
    policy: &RecoveryPolicy,
    observed_until: Timestamp,
) -> Vec<Episode> {
    let records = timeline.records();
    let mut episodes = Vec::new();
    let mut idx = 0;

    while idx < records.len() {
        if records[idx].is_served() {
            idx += 1;
            continue;
        }
        let (outcome, resolved) = resolve(records, idx, policy, observed_until);
        match resolved {
            Some(end) => {
                let absorbed = count_misses(&records[idx + 1..end]);
                episodes.push(episode(timeline, idx, outcome, absorbed));
                idx = end + 1;
            }
            None => {
                episodes.push(episode(timeline, idx, outcome, 0));
                idx += 1;
            }
        }
    }
    episodes
}

fn count_misses(records: &[CallRecord]) -> usize {
    records.iter().filter(|r| !r.is_served()).count()
}

fn classify_caller(
    timeline: &CallerTimeline,
    mode: EpisodeMode,
    policy: &RecoveryPolicy,
    observed_until: Timestamp,
) -> Vec<Episode> {
    match mode {
        EpisodeMode::FirstMiss => classify_first_miss(timeline, policy, observed_until)
            .into_iter()
            .collect(),
        EpisodeMode::PerOccurrence => classify_per_occurrence(timeline, policy, observed_until),
    }
}

/// Classify every caller sequentially. Episodes come out ordered by caller,
/// then by anchor.
pub fn classify_all(
    timelines: &Timelines,
    mode: EpisodeMode,
    policy: &RecoveryPolicy,
) -> Vec<Episode> {
    let Some(observed_until) = timelines.observed_until() else {
        return Vec::new();
    };
    let episodes: Vec<Episode> = timelines
        .iter()
        .flat_map(|tl| classify_caller(tl, mode, policy, observed_until))
        .collect();
    tracing::debug!(mode = mode.label(), episodes = episodes.len(), "classified callers");
    episodes
}

/// Same output as [`classify_all`], with callers spread over the rayon pool.
pub fn classify_all_parallel(
    timelines: &Timelines,
    mode: EpisodeMode,
    policy: &RecoveryPolicy,
) -> Vec<Episode> {
    let Some(observed_until) = timelines.observed_until() else {
        return Vec::new();
    };
    let callers: Vec<&CallerTimeline> = timelines.iter().collect();
    let per_caller: Vec<Vec<Episode>> = callers
        .par_iter()
        .map(|tl| classify_caller(tl, mode, policy, observed_until))
        .collect();
    let episodes: Vec<Episode> = per_caller.into_iter().flatten().collect();
    tracing::debug!(
        mode = mode.label(),
        episodes = episodes.len(),
        "classified callers in parallel"
    );
    episodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::build_timelines;
    use crate::timeline::test_support::{call, outbound};
    use ringback_core::{CallRecord, CallerId};
    use time::macros::datetime;
    use time::Duration;

    fn t0() -> Timestamp {
        datetime!(2024-01-01 10:00)
    }

    fn first_miss(recs: &[CallRecord]) -> Vec<Episode> {
        classify_all(
            &build_timelines(recs),
            EpisodeMode::FirstMiss,
            &RecoveryPolicy::default(),
        )
    }

    fn per_occurrence(recs: &[CallRecord]) -> Vec<Episode> {
        classify_all(
            &build_timelines(recs),
            EpisodeMode::PerOccurrence,
            &RecoveryPolicy::default(),
        )
    }

    /// Unrelated caller that pushes the end of the dataset out to `at`.
    fn horizon(at: Timestamp) -> CallRecord {
        call(999, "horizon", at, true)
    }

    #[test]
    fn served_inside_48h_recovers() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::hours(47) + Duration::minutes(59), true),
        ];
        let eps = first_miss(&recs);
        assert_eq!(eps.len(), 1);
        assert!(eps[0].outcome.is_recovered());
    }

    #[test]
    fn served_just_after_48h_does_not_recover() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::hours(48) + Duration::minutes(1), true),
            horizon(t0() + Duration::days(30)),
        ];
        let eps = first_miss(&recs);
        assert_eq!(eps[0].outcome, Outcome::Pending);
    }

    #[test]
    fn window_upper_bound_is_inclusive() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::hours(48), true),
        ];
        assert!(first_miss(&recs)[0].outcome.is_recovered());
    }

    #[test]
    fn same_instant_served_is_not_after_anchor() {
        let recs = [call(0, "1", t0(), false), call(1, "1", t0(), true)];
        assert_eq!(first_miss(&recs)[0].outcome, Outcome::Pending);
    }

    #[test]
    fn silent_week_is_lost() {
        let recs = [
            call(0, "777", t0(), false),
            horizon(t0() + Duration::days(10)),
        ];
        assert_eq!(first_miss(&recs)[0].outcome, Outcome::Lost);
    }

    #[test]
    fn loss_needs_the_whole_window_observed() {
        let recs = [
            call(0, "777", t0(), false),
            horizon(t0() + Duration::days(2)),
        ];
        assert_eq!(first_miss(&recs)[0].outcome, Outcome::Pending);

        let exact = [
            call(0, "777", t0(), false),
            horizon(t0() + Duration::days(7)),
        ];
        assert_eq!(first_miss(&exact)[0].outcome, Outcome::Lost);
    }

    #[test]
    fn contact_on_the_last_day_of_the_week_keeps_it_open() {
        let edge = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::days(7), false),
            horizon(t0() + Duration::days(30)),
        ];
        assert_eq!(first_miss(&edge)[0].outcome, Outcome::Pending);

        let past = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::days(7) + Duration::minutes(1), false),
            horizon(t0() + Duration::days(30)),
        ];
        assert_eq!(first_miss(&past)[0].outcome, Outcome::Lost);
    }

    #[test]
    fn windows_past_the_calendar_end_never_close() {
        let t = datetime!(9999-12-30 10:00);
        let missed = first_miss(&[call(0, "1", t, false)]);
        assert_eq!(missed[0].outcome, Outcome::Pending);

        let recs = [
            call(0, "1", t, false),
            call(1, "1", datetime!(9999-12-31 09:00), true),
        ];
        assert!(first_miss(&recs)[0].outcome.is_recovered());
        assert_eq!(per_occurrence(&recs).len(), 1);
    }

    #[test]
    fn call_after_the_loss_window_still_means_lost() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::days(8), true),
        ];
        assert_eq!(first_miss(&recs)[0].outcome, Outcome::Lost);
    }

    #[test]
    fn further_misses_inside_week_are_pending() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::days(3), false),
            horizon(t0() + Duration::days(30)),
        ];
        assert_eq!(first_miss(&recs)[0].outcome, Outcome::Pending);
    }

    #[test]
    fn single_record_caller() {
        let missed = first_miss(&[call(0, "1", t0(), false)]);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].outcome, Outcome::Pending);

        assert!(first_miss(&[call(0, "1", t0(), true)]).is_empty());
        assert!(first_miss(&[outbound(0, "1", t0())]).is_empty());
    }

    #[test]
    fn first_miss_mode_gives_one_episode_per_caller() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::hours(1), true),
            call(2, "1", t0() + Duration::days(1), false),
            call(3, "1", t0() + Duration::days(20), false),
        ];
        let eps = first_miss(&recs);
        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0].anchor_row, 0);
    }

    #[test]
    fn end_to_end_example() {
        let recs = [
            call(0, "555", datetime!(2024-01-01 10:00), false),
            call(1, "555", datetime!(2024-01-02 09:00), true),
            call(2, "777", datetime!(2024-01-01 12:00), false),
            horizon(datetime!(2024-01-11 12:00)),
        ];
        let eps = first_miss(&recs);
        let by = |c: &str| {
            eps.iter()
                .find(|e| e.caller_id == CallerId::new(c).unwrap())
                .unwrap()
                .outcome
        };
        assert_eq!(
            by("555"),
            Outcome::Recovered {
                row: 1,
                at: datetime!(2024-01-02 09:00),
                after_secs: 23 * 3600,
            }
        );
        assert_eq!(by("777"), Outcome::Lost);
    }

    #[test]
    fn per_occurrence_absorbs_misses_before_recovery() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::hours(1), false),
            call(2, "1", t0() + Duration::hours(2), true),
            call(3, "1", t0() + Duration::days(3), false),
            call(4, "1", t0() + Duration::days(3) + Duration::hours(5), true),
        ];
        let eps = per_occurrence(&recs);
        assert_eq!(eps.len(), 2);
        assert_eq!(eps[0].anchor_row, 0);
        assert_eq!(eps[0].absorbed_misses, 1);
        assert!(eps[0].outcome.is_recovered());
        assert_eq!(eps[1].anchor_row, 3);
        assert!(eps[1].outcome.is_recovered());
    }

    #[test]
    fn per_occurrence_pending_does_not_swallow_next_miss() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::days(3), false),
            call(2, "1", t0() + Duration::days(4), true),
        ];
        let eps = per_occurrence(&recs);
        assert_eq!(eps.len(), 2);
        assert_eq!(eps[0].outcome, Outcome::Pending);
        assert_eq!(eps[1].anchor_row, 1);
        assert!(eps[1].outcome.is_recovered());
    }

    #[test]
    fn no_missed_calls_no_episodes() {
        let recs = [
            call(0, "1", t0(), true),
            call(1, "1", t0() + Duration::hours(3), true),
        ];
        assert!(first_miss(&recs).is_empty());
        assert!(per_occurrence(&recs).is_empty());
    }

    #[test]
    fn classifier_does_not_touch_timelines() {
        let recs = [
            call(0, "1", t0(), false),
            call(1, "1", t0() + Duration::hours(2), true),
        ];
        let tl = build_timelines(&recs);
        let before = tl.iter().cloned().collect::<Vec<_>>();
        let _ = classify_all(&tl, EpisodeMode::PerOccurrence, &RecoveryPolicy::default());
        let after = tl.iter().cloned().collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut recs = Vec::new();
        for c in 0..40usize {
            for k in 0..5usize {
                let at = t0() + Duration::hours((c * 7 + k * 13) as i64);
                recs.push(call(c * 5 + k, &format!("c{c}"), at, (c + k) % 3 == 0));
            }
        }
        let tl = build_timelines(&recs);
        for mode in [EpisodeMode::FirstMiss, EpisodeMode::PerOccurrence] {
            let policy = RecoveryPolicy::default();
            assert_eq!(
                classify_all(&tl, mode, &policy),
                classify_all_parallel(&tl, mode, &policy)
            );
        }
    }
}
