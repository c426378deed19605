//! Property-based tests for the subscription state machine
//!
//! These tests verify:
//! - Access never improves as time passes
//! - Applying a decision and deciding again is a no-op
//! - Blocked and pending never grant access automatically
//! - The grace window always ends at 23:59:59 UTC

use caja_core::{GracePolicy, Transition};
use caja_types::{AccessStatus, SubscriptionStatus};
use chrono::{DateTime, Duration, Timelike, Utc};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// Instants between 2020 and 2040
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..2_208_988_800i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap_or_default())
}

/// Offsets of up to 60 days either side of an instant
fn arb_offset() -> impl Strategy<Value = Duration> {
    (-60 * 86_400i64..60 * 86_400i64).prop_map(Duration::seconds)
}

fn arb_status() -> impl Strategy<Value = SubscriptionStatus> {
    prop_oneof![
        Just(SubscriptionStatus::Pending),
        Just(SubscriptionStatus::Active),
        Just(SubscriptionStatus::Grace),
        Just(SubscriptionStatus::Blocked),
    ]
}

fn rank(access: AccessStatus) -> u8 {
    match access {
        AccessStatus::Active => 2,
        AccessStatus::Grace => 1,
        AccessStatus::Blocked => 0,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn access_never_improves_over_time(
        end in arb_instant(),
        a in arb_offset(),
        b in arb_offset(),
        days in 0u32..30,
    ) {
        let policy = GracePolicy::new(days);
        let (earlier, later) = if a <= b { (end + a, end + b) } else { (end + b, end + a) };

        let first = policy.decide(SubscriptionStatus::Active, Some(end), earlier);
        let second = policy.decide(first.next, Some(end), later);

        prop_assert!(rank(second.access) <= rank(first.access));
    }

    #[test]
    fn deciding_twice_is_a_no_op(
        status in arb_status(),
        end in arb_instant(),
        offset in arb_offset(),
    ) {
        let policy = GracePolicy::default();
        let now = end + offset;

        let first = policy.decide(status, Some(end), now);
        let second = policy.decide(first.next, Some(end), now);

        prop_assert_eq!(second.next, first.next);
        prop_assert_eq!(second.access, first.access);
        prop_assert!(second.transition.is_none());
    }

    #[test]
    fn transitions_match_status_changes(
        status in arb_status(),
        end in arb_instant(),
        offset in arb_offset(),
    ) {
        let decision = GracePolicy::default().decide(status, Some(end), end + offset);

        match decision.transition {
            Some(Transition::EnterGrace) => {
                prop_assert_eq!(status, SubscriptionStatus::Active);
                prop_assert_eq!(decision.next, SubscriptionStatus::Grace);
            }
            Some(Transition::Block) => {
                prop_assert!(matches!(status, SubscriptionStatus::Active | SubscriptionStatus::Grace));
                prop_assert_eq!(decision.next, SubscriptionStatus::Blocked);
            }
            None => {
                // Only grace -> active (extended end date) changes without a persisted edge
                prop_assert!(
                    decision.next == status
                        || (status == SubscriptionStatus::Grace
                            && decision.next == SubscriptionStatus::Active)
                );
            }
        }
    }

    #[test]
    fn terminal_and_pending_states_deny(
        end in proptest::option::of(arb_instant()),
        now in arb_instant(),
    ) {
        let policy = GracePolicy::default();
        for status in [SubscriptionStatus::Pending, SubscriptionStatus::Blocked] {
            let decision = policy.decide(status, end, now);
            prop_assert_eq!(decision.next, status);
            prop_assert_eq!(decision.access, AccessStatus::Blocked);
            prop_assert!(decision.transition.is_none());
        }
    }

    #[test]
    fn missing_end_date_denies_without_transition(
        status in arb_status(),
        now in arb_instant(),
    ) {
        let decision = GracePolicy::default().decide(status, None, now);
        prop_assert_eq!(decision.access, AccessStatus::Blocked);
        prop_assert!(decision.transition.is_none());
    }

    #[test]
    fn before_end_date_is_active(end in arb_instant(), before in 0i64..400 * 86_400) {
        let decision = GracePolicy::default().decide(
            SubscriptionStatus::Active,
            Some(end),
            end - Duration::seconds(before),
        );
        prop_assert_eq!(decision.access, AccessStatus::Active);
        prop_assert!(decision.transition.is_none());
    }

    #[test]
    fn grace_window_ends_at_end_of_day(end in arb_instant(), days in 0u32..60) {
        let grace_end = GracePolicy::new(days).grace_end(end);

        prop_assert_eq!((grace_end.hour(), grace_end.minute(), grace_end.second()), (23, 59, 59));
        prop_assert!(grace_end >= end + Duration::days(i64::from(days)));
        prop_assert!(grace_end < end + Duration::days(i64::from(days) + 1));
    }
}
