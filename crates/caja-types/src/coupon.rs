//! Coupon types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CouponId, ParseError, Plan, UserId};

/// Coupon status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    /// Can be redeemed
    Active,
    /// Already redeemed
    Used,
}

impl CouponStatus {
    /// Stored / wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
        }
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CouponStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "used" => Ok(Self::Used),
            _ => Err(ParseError::new("coupon status", s)),
        }
    }
}

/// Single-use code granting one subscription period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Unique redemption code
    pub code: String,
    /// Plan granted on redemption
    pub coupon_type: Plan,
    pub status: CouponStatus,
    /// Who redeemed it
    pub used_by: Option<UserId>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
