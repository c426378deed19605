//! In-memory repositories for testing
//!
//! One [`MockStore`] implements every repository trait so multi-table units
//! of work (redemption, activation, transitions) can be applied atomically
//! under a single lock, mirroring the transactions of the Postgres
//! implementations.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use caja_db::{
    ActivateSubscription, AuditLogRepository, AuditLogRow, CouponRepository, CouponRow,
    CreateAuditEntry, CreateCoupon, CreateSubscription, DbError, DbResult, DocumentSequenceRow,
    RedeemCoupon, SequenceRepository, SubscriptionRepository, SubscriptionRow,
};
use caja_types::{Plan, SubscriptionStatus, TenantId, UserId};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

/// In-memory store for all Caja tables
#[derive(Default, Clone)]
pub struct MockStore {
    tenants: Arc<DashSet<Uuid>>,
    sequences: Arc<DashMap<(Uuid, String), DocumentSequenceRow>>,
    /// id -> (insertion order, row)
    subscriptions: Arc<DashMap<Uuid, (u64, SubscriptionRow)>>,
    coupons: Arc<DashMap<String, CouponRow>>,
    audit_logs: Arc<Mutex<Vec<AuditLogRow>>>,
    /// Serializes multi-table units of work
    unit_of_work: Arc<Mutex<()>>,
    insertion_order: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
    fail_audit_writes: Arc<AtomicBool>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant so sequences may reference it
    pub fn add_tenant(&self) -> TenantId {
        let id = TenantId::new();
        self.tenants.insert(id.0);
        id
    }

    /// Make every call fail as if the pool timed out
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make any unit of work that appends an audit entry fail midway
    pub fn set_fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a subscription row directly
    pub fn insert_subscription(
        &self,
        user_id: UserId,
        plan: Plan,
        status: SubscriptionStatus,
        end_date: Option<DateTime<Utc>>,
    ) -> SubscriptionRow {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: user_id.0,
            plan: plan.as_str().to_string(),
            status: status.as_str().to_string(),
            start_date: end_date.map(|_| now),
            end_date,
            payment_method: "card".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.put_subscription(row.clone());
        row
    }

    /// Insert a coupon row directly
    pub fn insert_coupon(&self, code: &str, coupon_type: Plan, used_by: Option<UserId>) -> CouponRow {
        let row = CouponRow {
            id: Uuid::new_v4(),
            code: code.to_string(),
            coupon_type: coupon_type.as_str().to_string(),
            status: if used_by.is_some() { "used" } else { "active" }.to_string(),
            used_by: used_by.map(|u| u.0),
            used_at: used_by.map(|_| Utc::now()),
            created_at: Utc::now(),
        };
        self.coupons.insert(row.code.clone(), row.clone());
        row
    }

    pub fn subscription(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subscriptions.get(&id).map(|r| r.value().1.clone())
    }

    pub fn subscriptions_for(&self, user_id: UserId) -> Vec<SubscriptionRow> {
        self.subscriptions
            .iter()
            .filter(|r| r.value().1.user_id == user_id.0)
            .map(|r| r.value().1.clone())
            .collect()
    }

    pub fn coupon(&self, code: &str) -> Option<CouponRow> {
        self.coupons.get(code).map(|r| r.value().clone())
    }

    pub fn audit_entries(&self) -> Vec<AuditLogRow> {
        self.audit_logs.lock().unwrap().clone()
    }

    pub fn audit_entries_for(&self, user_id: UserId) -> Vec<AuditLogRow> {
        self.audit_entries()
            .into_iter()
            .filter(|e| e.user_id == Some(user_id.0))
            .collect()
    }

    pub fn sequence_value(&self, tenant_id: TenantId, document_type: &str) -> Option<i64> {
        self.sequences
            .get(&(tenant_id.0, document_type.to_string()))
            .map(|r| r.current_number)
    }

    fn put_subscription(&self, row: SubscriptionRow) {
        let order = self.insertion_order.fetch_add(1, Ordering::SeqCst);
        self.subscriptions.insert(row.id, (order, row));
    }

    fn check_online(&self) -> DbResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbError::from(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn check_audit_writable(&self) -> DbResult<()> {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(DbError::from(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn audit_row(entry: &CreateAuditEntry) -> AuditLogRow {
        AuditLogRow {
            id: entry.id,
            user_id: entry.user_id,
            action: entry.action.clone(),
            detail: entry.detail.clone(),
            created_at: Utc::now(),
        }
    }

    fn push_audit(&self, entry: &CreateAuditEntry) -> AuditLogRow {
        let row = Self::audit_row(entry);
        self.audit_logs.lock().unwrap().push(row.clone());
        row
    }
}

#[async_trait]
impl SequenceRepository for MockStore {
    async fn increment(
        &self,
        tenant_id: Uuid,
        document_type: &str,
        prefix: &str,
    ) -> DbResult<DocumentSequenceRow> {
        self.check_online()?;
        if !self.tenants.contains(&tenant_id) {
            return Err(DbError::ForeignKeyViolation(
                "document_sequences_tenant_id_fkey".to_string(),
            ));
        }

        // The entry guard holds the shard lock: read-modify-write is atomic
        let mut entry = self
            .sequences
            .entry((tenant_id, document_type.to_string()))
            .or_insert_with(|| DocumentSequenceRow {
                tenant_id,
                document_type: document_type.to_string(),
                prefix: prefix.to_string(),
                current_number: 0,
                updated_at: Utc::now(),
            });
        entry.current_number += 1;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn find(
        &self,
        tenant_id: Uuid,
        document_type: &str,
    ) -> DbResult<Option<DocumentSequenceRow>> {
        self.check_online()?;
        Ok(self
            .sequences
            .get(&(tenant_id, document_type.to_string()))
            .map(|r| r.value().clone()))
    }
}

#[async_trait]
impl SubscriptionRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        Ok(self.subscription(id))
    }

    async fn find_latest_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| r.value().1.user_id == user_id)
            .max_by_key(|r| (r.value().1.created_at, r.value().0))
            .map(|r| r.value().1.clone()))
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        self.check_online()?;
        let now = Utc::now();
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            plan: sub.plan,
            status: sub.status,
            start_date: sub.start_date,
            end_date: sub.end_date,
            payment_method: sub.payment_method,
            created_at: now,
            updated_at: now,
        };
        self.put_subscription(row.clone());
        Ok(row)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &str,
        to: &str,
        audit: CreateAuditEntry,
    ) -> DbResult<bool> {
        self.check_online()?;
        let _uow = self.unit_of_work.lock().unwrap();

        let Some(mut entry) = self.subscriptions.get_mut(&id) else {
            return Ok(false);
        };
        if entry.1.status != from {
            return Ok(false);
        }
        self.check_audit_writable()?;

        entry.1.status = to.to_string();
        entry.1.updated_at = Utc::now();
        drop(entry);
        self.push_audit(&audit);
        Ok(true)
    }

    async fn activate(&self, activation: ActivateSubscription) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        let _uow = self.unit_of_work.lock().unwrap();

        let Some(mut entry) = self.subscriptions.get_mut(&activation.id) else {
            return Ok(None);
        };
        if entry.1.status == "active" {
            return Ok(None);
        }
        self.check_audit_writable()?;

        entry.1.status = "active".to_string();
        entry.1.start_date = Some(activation.start_date);
        entry.1.end_date = Some(activation.end_date);
        entry.1.updated_at = Utc::now();
        let row = entry.1.clone();
        drop(entry);
        self.push_audit(&activation.audit);
        Ok(Some(row))
    }
}

#[async_trait]
impl CouponRepository for MockStore {
    async fn find_by_code(&self, code: &str) -> DbResult<Option<CouponRow>> {
        self.check_online()?;
        Ok(self.coupon(code))
    }

    async fn list(&self, status: Option<&str>, limit: i64) -> DbResult<Vec<CouponRow>> {
        self.check_online()?;
        let mut rows: Vec<CouponRow> = self
            .coupons
            .iter()
            .filter(|r| status.map_or(true, |s| r.value().status == s))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn create(&self, coupon: CreateCoupon, audit: CreateAuditEntry) -> DbResult<CouponRow> {
        self.check_online()?;
        let _uow = self.unit_of_work.lock().unwrap();

        if self.coupons.contains_key(&coupon.code) {
            return Err(DbError::UniqueViolation("coupons_code_key".to_string()));
        }
        self.check_audit_writable()?;

        let row = CouponRow {
            id: coupon.id,
            code: coupon.code.clone(),
            coupon_type: coupon.coupon_type,
            status: "active".to_string(),
            used_by: None,
            used_at: None,
            created_at: Utc::now(),
        };
        self.coupons.insert(coupon.code, row.clone());
        self.push_audit(&audit);
        Ok(row)
    }

    async fn redeem(&self, redemption: RedeemCoupon) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        let _uow = self.unit_of_work.lock().unwrap();

        let Some(mut coupon) = self.coupons.get_mut(&redemption.code) else {
            return Ok(None);
        };
        if coupon.status != "active" || coupon.coupon_type != redemption.coupon_type {
            return Ok(None);
        }
        // Fail before touching anything, like a rolled-back transaction
        self.check_audit_writable()?;

        let now = Utc::now();
        coupon.status = "used".to_string();
        coupon.used_by = Some(redemption.user_id);
        coupon.used_at = Some(now);
        drop(coupon);

        let sub = redemption.subscription;
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            plan: sub.plan,
            status: sub.status,
            start_date: sub.start_date,
            end_date: sub.end_date,
            payment_method: sub.payment_method,
            created_at: now,
            updated_at: now,
        };
        self.put_subscription(row.clone());
        self.push_audit(&redemption.audit);
        Ok(Some(row))
    }
}

#[async_trait]
impl AuditLogRepository for MockStore {
    async fn append(&self, entry: CreateAuditEntry) -> DbResult<AuditLogRow> {
        self.check_online()?;
        self.check_audit_writable()?;
        Ok(self.push_audit(&entry))
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<AuditLogRow>> {
        self.check_online()?;
        let mut rows: Vec<AuditLogRow> = self
            .audit_entries()
            .into_iter()
            .filter(|e| e.user_id == Some(user_id))
            .collect();
        rows.reverse();
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }
}
