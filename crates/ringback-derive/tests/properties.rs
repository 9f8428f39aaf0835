//! Property checks for the recovery classifier:
//! - identical input gives identical episodes
//! - input order across callers does not matter
//! - the rayon path matches the sequential path
//! - first-miss mode yields at most one episode per caller

use proptest::prelude::*;
use ringback_core::{CallRecord, CallStatus, CallerId, Direction, RecoveryPolicy};
use ringback_derive::{
    build_timelines, classify_all, classify_all_parallel, extract_attempt_gaps, EpisodeMode,
    Outcome,
};
use time::macros::datetime;
use time::Duration;

// =============================================================================
// Strategies
// =============================================================================

/// (caller index, hour offset, served, inbound)
fn arb_call() -> impl Strategy<Value = (u8, i64, bool, bool)> {
    (0u8..6, 0i64..400, any::<bool>(), prop::bool::weighted(0.9))
}

fn to_records(calls: &[(u8, i64, bool, bool)]) -> Vec<CallRecord> {
    let base = datetime!(2024-03-01 00:00);
    calls
        .iter()
        .enumerate()
        .map(|(row, &(caller, hours, served, inbound))| {
            // the row term keeps every start time distinct
            let start = base + Duration::hours(hours) + Duration::minutes(row as i64);
            CallRecord {
                row,
                caller_id: CallerId::new(format!("c{caller}")),
                direction: if inbound {
                    Direction::Inbound
                } else {
                    Direction::Outbound
                },
                start_time: start,
                answer_time: served.then_some(start),
                end_time: None,
                status: if served {
                    CallStatus::Served
                } else {
                    CallStatus::NotServed
                },
                conversation_secs: 0,
                waiting_secs: 0,
                destination: None,
                operator: None,
            }
        })
        .collect()
}

fn arb_records() -> impl Strategy<Value = Vec<CallRecord>> {
    prop::collection::vec(arb_call(), 0..50).prop_map(|calls| to_records(&calls))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn classification_is_deterministic(recs in arb_records()) {
        let policy = RecoveryPolicy::default();
        for mode in [EpisodeMode::FirstMiss, EpisodeMode::PerOccurrence] {
            let a = classify_all(&build_timelines(&recs), mode, &policy);
            let b = classify_all(&build_timelines(&recs), mode, &policy);
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn input_order_is_irrelevant(
        (recs, shuffled) in arb_records().prop_flat_map(|r| {
            let s = Just(r.clone()).prop_shuffle();
            (Just(r), s)
        })
    ) {
        let policy = RecoveryPolicy::default();
        for mode in [EpisodeMode::FirstMiss, EpisodeMode::PerOccurrence] {
            let a = classify_all(&build_timelines(&recs), mode, &policy);
            let b = classify_all(&build_timelines(&shuffled), mode, &policy);
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn parallel_matches_sequential(recs in arb_records()) {
        let tl = build_timelines(&recs);
        let policy = RecoveryPolicy::default();
        for mode in [EpisodeMode::FirstMiss, EpisodeMode::PerOccurrence] {
            prop_assert_eq!(
                classify_all(&tl, mode, &policy),
                classify_all_parallel(&tl, mode, &policy)
            );
        }
    }

    #[test]
    fn first_miss_is_one_per_caller(recs in arb_records()) {
        let tl = build_timelines(&recs);
        let eps = classify_all(&tl, EpisodeMode::FirstMiss, &RecoveryPolicy::default());
        prop_assert!(eps.len() <= tl.len());
        for pair in eps.windows(2) {
            prop_assert!(pair[0].caller_id < pair[1].caller_id);
        }
    }

    #[test]
    fn recoveries_fall_inside_the_window(recs in arb_records()) {
        let policy = RecoveryPolicy::default();
        let tl = build_timelines(&recs);
        for ep in classify_all(&tl, EpisodeMode::PerOccurrence, &policy) {
            if let Outcome::Recovered { at, after_secs, .. } = ep.outcome {
                prop_assert!(at > ep.anchor_at);
                prop_assert!(at <= ep.anchor_at + policy.recovery_window);
                prop_assert_eq!(after_secs, (at - ep.anchor_at).whole_seconds());
            }
        }
    }

    #[test]
    fn gaps_are_non_negative_and_skip_first_calls(recs in arb_records()) {
        let tl = build_timelines(&recs);
        let gaps = extract_attempt_gaps(&tl, &[]);
        for gap in &gaps {
            prop_assert!(gap.since_previous_secs >= 0);
            prop_assert!(gap.attempt >= 2);
            let first = tl.get(&gap.caller_id).unwrap().records()[0].row;
            prop_assert_ne!(gap.row, first);
        }
    }
}
