//! Subscription types

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::{ParseError, SubscriptionId, UserId};

/// Billing plan; also the grant type of a coupon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// One calendar month per period
    Monthly,
    /// One calendar year per period
    Annual,
}

impl Plan {
    /// Stored / wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }

    /// Length of one period in calendar months
    pub const fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Annual => 12,
        }
    }

    /// End of a period starting at `start`.
    ///
    /// Calendar arithmetic: Jan 31 + 1 month is the last day of February.
    /// Returns `None` only if the result is out of chrono's range.
    pub fn period_end(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        start.checked_add_months(Months::new(self.months()))
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "mensual" => Ok(Self::Monthly),
            "annual" | "yearly" | "anual" => Ok(Self::Annual),
            _ => Err(ParseError::new("plan", s)),
        }
    }
}

/// Persisted subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Checkout started, payment not confirmed yet
    Pending,
    /// Paid (or coupon-granted) and within its period
    Active,
    /// Period over, inside the grace window
    Grace,
    /// Grace window over; only a new payment or coupon restores access
    Blocked,
}

impl SubscriptionStatus {
    /// Stored / wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Grace => "grace",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "grace" => Ok(Self::Grace),
            "blocked" => Ok(Self::Blocked),
            _ => Err(ParseError::new("subscription status", s)),
        }
    }
}

/// What the page gate should do for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    /// Render normally
    Active,
    /// Render with a grace-period banner
    Grace,
    /// Render the block screen
    Blocked,
}

impl AccessStatus {
    /// Whether content may be rendered at all
    pub const fn allows_access(&self) -> bool {
        matches!(self, Self::Active | Self::Grace)
    }
}

impl std::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Grace => f.write_str("grace"),
            Self::Blocked => f.write_str("blocked"),
        }
    }
}

/// User subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// User who owns the subscription
    pub user_id: UserId,
    /// Billing plan
    pub plan: Plan,
    /// Persisted status
    pub status: SubscriptionStatus,
    /// Start of the paid window (unset while pending)
    pub start_date: Option<DateTime<Utc>>,
    /// End of the paid window (unset while pending)
    pub end_date: Option<DateTime<Utc>>,
    /// How the subscription was paid (`"coupon"` for redemptions)
    pub payment_method: String,
    /// When the subscription was created
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_monthly_period_end() {
        let start = Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap();
        let end = Plan::Monthly.period_end(start).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 4, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_period_clamps_to_month_end() {
        let start = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let end = Plan::Monthly.period_end(start).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_annual_period_end() {
        let start = Utc.with_ymd_and_hms(2028, 2, 29, 0, 0, 0).unwrap();
        let end = Plan::Annual.period_end(start).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2029, 2, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "GRACE".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Grace
        );
        assert!("trialing".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn test_plan_parse_aliases() {
        assert_eq!("mensual".parse::<Plan>().unwrap(), Plan::Monthly);
        assert_eq!("yearly".parse::<Plan>().unwrap(), Plan::Annual);
        assert!("weekly".parse::<Plan>().is_err());
    }

    #[test]
    fn test_access_allows() {
        assert!(AccessStatus::Active.allows_access());
        assert!(AccessStatus::Grace.allows_access());
        assert!(!AccessStatus::Blocked.allows_access());
    }
}
