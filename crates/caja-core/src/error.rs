//! Core errors

use caja_db::DbError;
use caja_types::TenantId;
use thiserror::Error;

/// Document numbering errors
#[derive(Error, Debug)]
pub enum SequenceError {
    /// The tenant does not exist
    #[error("unknown tenant: {0}")]
    UnknownTenant(TenantId),

    /// The counter could not be read or advanced; retry later
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] DbError),

    /// The stored counter is not a valid number
    #[error("corrupt sequence counter: {0}")]
    CorruptCounter(String),
}

impl SequenceError {
    /// Whether the caller may retry the enclosing business operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

/// Subscription and coupon errors
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// Coupon code does not exist
    #[error("invalid coupon")]
    InvalidCoupon,

    /// Coupon was already redeemed
    #[error("coupon already used")]
    AlreadyUsed,

    /// Coupon code is malformed
    #[error("invalid coupon code: {0}")]
    InvalidCouponCode(String),

    /// Coupon code is taken
    #[error("coupon already exists: {0}")]
    DuplicateCoupon(String),

    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Payment method is missing or malformed
    #[error("invalid payment method")]
    InvalidPaymentMethod,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl SubscriptionError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SubscriptionNotFound | Self::InvalidCoupon)
    }

    /// Check if this is a user-facing rejection that mutated nothing
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidCoupon
                | Self::AlreadyUsed
                | Self::InvalidCouponCode(_)
                | Self::DuplicateCoupon(_)
                | Self::InvalidPaymentMethod
        )
    }
}

/// Payment webhook verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// Signature header lacks `t=`
    #[error("missing timestamp")]
    MissingTimestamp,

    /// Signature header lacks `v1=`
    #[error("missing signature")]
    MissingSignature,

    /// Timestamp is not an integer
    #[error("invalid timestamp format")]
    InvalidTimestamp,

    /// HMAC mismatch
    #[error("signature verification failed")]
    InvalidSignature,

    /// Timestamp outside the tolerance window
    #[error("timestamp too old")]
    StaleTimestamp,

    /// Body is not a valid event
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_failures_are_retryable() {
        let outage = SequenceError::StorageUnavailable(DbError::from(sqlx::Error::PoolTimedOut));
        assert!(outage.is_retryable());
        assert!(!SequenceError::UnknownTenant(TenantId::new()).is_retryable());
        assert!(!SequenceError::CorruptCounter("-1".into()).is_retryable());
    }

    #[test]
    fn test_rejections() {
        assert!(SubscriptionError::AlreadyUsed.is_rejection());
        assert!(SubscriptionError::InvalidCoupon.is_rejection());
        assert!(!SubscriptionError::Internal("x".into()).is_rejection());
        assert!(SubscriptionError::SubscriptionNotFound.is_not_found());
    }
}
