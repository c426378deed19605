//! PostgreSQL coupon repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use super::audit::insert_audit;
use crate::error::DbResult;
use crate::models::{CouponRow, SubscriptionRow};
use crate::repo::{CouponRepository, CreateAuditEntry, CreateCoupon, RedeemCoupon};

/// PostgreSQL coupon repository
#[derive(Clone)]
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    /// Create a new coupon repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn find_by_code(&self, code: &str) -> DbResult<Option<CouponRow>> {
        let coupon = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT id, code, coupon_type, status, used_by, used_at, created_at
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    async fn list(&self, status: Option<&str>, limit: i64) -> DbResult<Vec<CouponRow>> {
        let coupons = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT id, code, coupon_type, status, used_by, used_at, created_at
            FROM coupons
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    async fn create(&self, coupon: CreateCoupon, audit: CreateAuditEntry) -> DbResult<CouponRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CouponRow>(
            r#"
            INSERT INTO coupons (id, code, coupon_type)
            VALUES ($1, $2, $3)
            RETURNING id, code, coupon_type, status, used_by, used_at, created_at
            "#,
        )
        .bind(coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.coupon_type)
        .fetch_one(&mut *tx)
        .await?;

        insert_audit(&mut tx, &audit).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn redeem(&self, redemption: RedeemCoupon) -> DbResult<Option<SubscriptionRow>> {
        let mut tx = self.pool.begin().await?;

        let consumed = sqlx::query(
            r#"
            UPDATE coupons
            SET status = 'used', used_by = $2, used_at = NOW()
            WHERE code = $1 AND status = 'active' AND coupon_type = $3
            "#,
        )
        .bind(&redemption.code)
        .bind(redemption.user_id)
        .bind(&redemption.coupon_type)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if consumed == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let sub = redemption.subscription;
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
        .fetch_one(&mut *tx)
        .await?;

        insert_audit(&mut tx, &redemption.audit).await?;
        tx.commit().await?;

        Ok(Some(row))
    }
}
