//! Audit log types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ParseError, UserId};

/// Action tag of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Subscription entered its grace window
    SubscriptionGrace,
    /// Subscription was blocked after grace
    SubscriptionBlocked,
    /// Payment confirmed, subscription activated
    PaymentConfirmed,
    /// Coupon redeemed, subscription activated
    CouponRedeemed,
    /// Coupon issued from the back-office
    CouponCreated,
}

impl AuditAction {
    /// Stored representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionGrace => "SUBSCRIPTION_GRACE",
            Self::SubscriptionBlocked => "SUBSCRIPTION_BLOCKED",
            Self::PaymentConfirmed => "PAYMENT_CONFIRMED",
            Self::CouponRedeemed => "COUPON_REDEEMED",
            Self::CouponCreated => "COUPON_CREATED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBSCRIPTION_GRACE" => Ok(Self::SubscriptionGrace),
            "SUBSCRIPTION_BLOCKED" => Ok(Self::SubscriptionBlocked),
            "PAYMENT_CONFIRMED" => Ok(Self::PaymentConfirmed),
            "COUPON_REDEEMED" => Ok(Self::CouponRedeemed),
            "COUPON_CREATED" => Ok(Self::CouponCreated),
            _ => Err(ParseError::new("audit action", s)),
        }
    }
}

/// Append-only audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Actor (or subject, for automatic transitions)
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    /// Human-readable detail
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
