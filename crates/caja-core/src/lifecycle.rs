//! Subscription lifecycle state machine
//!
//! Pure functions only: given the persisted status, the end of the paid
//! window and the current time, decide the next status and what the page
//! gate should show. Persisting and auditing the outcome is the job of
//! [`SubscriptionEngine`](crate::SubscriptionEngine).
//!
//! # Transitions
//!
//! | Persisted | Condition                       | Next    | Access  | Logged |
//! |-----------|---------------------------------|---------|---------|--------|
//! | pending   | any                             | pending | blocked | no     |
//! | blocked   | any                             | blocked | blocked | no     |
//! | active    | no end date                     | active  | blocked | no     |
//! | grace     | no end date                     | grace   | blocked | no     |
//! | active    | now <= end                      | active  | active  | no     |
//! | active    | end < now <= grace end          | grace   | grace   | yes    |
//! | grace     | end < now <= grace end          | grace   | grace   | no     |
//! | grace     | now <= end                      | active  | active  | no     |
//! | active    | now > grace end                 | blocked | blocked | yes    |
//! | grace     | now > grace end                 | blocked | blocked | yes    |

use caja_types::{AccessStatus, SubscriptionStatus};
use chrono::{DateTime, Days, Utc};

/// Default length of the grace window
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 7;

/// A status change that must be persisted and audited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `active -> grace`
    EnterGrace,
    /// `active | grace -> blocked`
    Block,
}

impl Transition {
    /// Metric / log label
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnterGrace => "grace",
            Self::Block => "blocked",
        }
    }
}

/// Outcome of evaluating a subscription at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Status the subscription should have now
    pub next: SubscriptionStatus,
    /// What the page gate should do
    pub access: AccessStatus,
    /// Set when the change from the persisted status must be written
    pub transition: Option<Transition>,
}

/// Grace window rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePolicy {
    days: u32,
}

impl GracePolicy {
    /// Policy with a grace window of `days` days
    pub const fn new(days: u32) -> Self {
        Self { days }
    }

    /// Length of the grace window in days
    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Last instant of access: 23:59:59 UTC on the day `days` after `end_date`.
    pub fn grace_end(&self, end_date: DateTime<Utc>) -> DateTime<Utc> {
        end_date
            .date_naive()
            .checked_add_days(Days::new(u64::from(self.days)))
            .and_then(|day| day.and_hms_opt(23, 59, 59))
            .map_or(DateTime::<Utc>::MAX_UTC, |dt| dt.and_utc())
    }

    /// Status a subscription should have at `now`
    pub fn next_status(
        &self,
        current: SubscriptionStatus,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SubscriptionStatus {
        use SubscriptionStatus::*;

        match (current, end_date) {
            (Pending | Blocked, _) => current,
            // No well-defined expiry: leave the row alone, access is denied below
            (Active | Grace, None) => current,
            (Active | Grace, Some(end)) => {
                if now <= end {
                    Active
                } else if now <= self.grace_end(end) {
                    Grace
                } else {
                    Blocked
                }
            }
        }
    }

    /// Full decision for the persisted state at `now`
    pub fn decide(
        &self,
        current: SubscriptionStatus,
        end_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Decision {
        let next = self.next_status(current, end_date, now);
        Decision {
            next,
            access: access_for(next, end_date),
            transition: transition_between(current, next),
        }
    }
}

impl Default for GracePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD_DAYS)
    }
}

/// [`GracePolicy::next_status`] with the default seven-day window
pub fn next_status(
    current: SubscriptionStatus,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    GracePolicy::default().next_status(current, end_date, now)
}

/// Map a status onto what the gate shows. Anything without an end date is
/// denied.
pub fn access_for(status: SubscriptionStatus, end_date: Option<DateTime<Utc>>) -> AccessStatus {
    match (status, end_date) {
        (SubscriptionStatus::Active, Some(_)) => AccessStatus::Active,
        (SubscriptionStatus::Grace, Some(_)) => AccessStatus::Grace,
        _ => AccessStatus::Blocked,
    }
}

/// Only the automatic edges into grace and blocked are persisted
fn transition_between(from: SubscriptionStatus, to: SubscriptionStatus) -> Option<Transition> {
    use SubscriptionStatus::*;

    match (from, to) {
        (Active, Grace) => Some(Transition::EnterGrace),
        (Active | Grace, Blocked) => Some(Transition::Block),
        _ => None,
    }
}
