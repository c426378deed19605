//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::audit::insert_audit;
use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{
    ActivateSubscription, CreateAuditEntry, CreateSubscription, SubscriptionRepository,
};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan, status, start_date, end_date, payment_method,
                   created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_latest_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan, status, start_date, end_date, payment_method,
                   created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, user_id, plan, status, start_date, end_date,
                                       payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, plan, status, start_date, end_date, payment_method,
                      created_at, updated_at
            "#,
        )
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(&sub.plan)
        .bind(&sub.status)
        .bind(sub.start_date)
        .bind(sub.end_date)
        .bind(&sub.payment_method)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &str,
        to: &str,
        audit: CreateAuditEntry,
    ) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE subscriptions SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_audit(&mut tx, &audit).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn activate(&self, activation: ActivateSubscription) -> DbResult<Option<SubscriptionRow>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET status = 'active', start_date = $2, end_date = $3, updated_at = NOW()
            WHERE id = $1 AND status <> 'active'
            RETURNING id, user_id, plan, status, start_date, end_date, payment_method,
                      created_at, updated_at
            "#,
        )
        .bind(activation.id)
        .bind(activation.start_date)
        .bind(activation.end_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        insert_audit(&mut tx, &activation.audit).await?;
        tx.commit().await?;

        Ok(Some(row))
    }
}
