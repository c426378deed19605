//! Repository traits
//!
//! Define async repository interfaces for database operations.
//!
//! Methods that touch more than one table (activation, redemption, status
//! transitions) are single units of work: implementations must apply all of
//! their writes or none of them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Document sequence repository trait
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// Create the counter if missing and increment it, in one atomic step.
    ///
    /// Returns the row as it stands after the increment. A missing counter
    /// behaves as if it had existed at zero, so the first call yields 1.
    async fn increment(
        &self,
        tenant_id: Uuid,
        document_type: &str,
        prefix: &str,
    ) -> DbResult<DocumentSequenceRow>;

    /// Read the counter without touching it
    async fn find(&self, tenant_id: Uuid, document_type: &str)
        -> DbResult<Option<DocumentSequenceRow>>;
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the most recently created subscription for a user
    async fn find_latest_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Create a new subscription
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Move `id` from status `from` to status `to` and append `audit`.
    ///
    /// Only applies if the stored status still equals `from`; returns whether
    /// the transition happened. The audit entry is written only when it did.
    async fn transition_status(
        &self,
        id: Uuid,
        from: &str,
        to: &str,
        audit: CreateAuditEntry,
    ) -> DbResult<bool>;

    /// Mark a non-active subscription active with the given window and
    /// append `audit`.
    ///
    /// Returns `None` (and writes nothing) if the subscription is already
    /// active or does not exist.
    async fn activate(&self, activation: ActivateSubscription) -> DbResult<Option<SubscriptionRow>>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_method: String,
}

/// Activate subscription input
#[derive(Debug, Clone)]
pub struct ActivateSubscription {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub audit: CreateAuditEntry,
}

/// Coupon repository trait
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Find a coupon by code
    async fn find_by_code(&self, code: &str) -> DbResult<Option<CouponRow>>;

    /// List coupons, newest first, optionally filtered by status
    async fn list(&self, status: Option<&str>, limit: i64) -> DbResult<Vec<CouponRow>>;

    /// Create a coupon and append `audit`
    async fn create(&self, coupon: CreateCoupon, audit: CreateAuditEntry) -> DbResult<CouponRow>;

    /// Consume a coupon and grant its subscription.
    ///
    /// Marks the coupon used (only if it is still active and of the expected
    /// type), inserts the subscription and appends the audit entry. Returns
    /// `None` and writes nothing if the coupon was not redeemable.
    async fn redeem(&self, redemption: RedeemCoupon) -> DbResult<Option<SubscriptionRow>>;
}

/// Create coupon input
#[derive(Debug, Clone)]
pub struct CreateCoupon {
    pub id: Uuid,
    pub code: String,
    pub coupon_type: String,
}

/// Redeem coupon input
#[derive(Debug, Clone)]
pub struct RedeemCoupon {
    pub code: String,
    pub coupon_type: String,
    pub user_id: Uuid,
    pub subscription: CreateSubscription,
    pub audit: CreateAuditEntry,
}

/// Audit log repository trait
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: CreateAuditEntry) -> DbResult<AuditLogRow>;

    /// Entries for a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<AuditLogRow>>;
}

/// Create audit entry input
#[derive(Debug, Clone)]
pub struct CreateAuditEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub detail: String,
}
