//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use caja_types::{
    AuditEntry, Coupon, CouponId, DocumentType, Subscription, SubscriptionId, TenantId, UserId,
};

use crate::DbError;

/// Document sequence counter row
#[derive(Debug, Clone, FromRow)]
pub struct DocumentSequenceRow {
    pub tenant_id: Uuid,
    pub document_type: String,
    pub prefix: String,
    pub current_number: i64,
    pub updated_at: DateTime<Utc>,
}

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Coupon row from the database
#[derive(Debug, Clone, FromRow)]
pub struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub coupon_type: String,
    pub status: String,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Audit log row from the database
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

// Conversion implementations from Row types to caja-types domain types
impl DocumentSequenceRow {
    /// Convert to domain TenantId
    pub fn tenant_id(&self) -> TenantId {
        TenantId(self.tenant_id)
    }

    /// Parse the stored document type
    pub fn document_type(&self) -> Result<DocumentType, DbError> {
        Ok(self.document_type.parse()?)
    }

    /// Counter value as an unsigned number
    pub fn number(&self) -> Result<u64, DbError> {
        u64::try_from(self.current_number).map_err(|_| {
            DbError::Corrupt(format!("negative sequence value {}", self.current_number))
        })
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DbError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubscriptionId(row.id),
            user_id: UserId(row.user_id),
            plan: row.plan.parse()?,
            status: row.status.parse()?,
            start_date: row.start_date,
            end_date: row.end_date,
            payment_method: row.payment_method,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CouponId(row.id),
            code: row.code,
            coupon_type: row.coupon_type.parse()?,
            status: row.status.parse()?,
            used_by: row.used_by.map(UserId),
            used_at: row.used_at,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<AuditLogRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id.map(UserId),
            action: row.action.parse()?,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}
