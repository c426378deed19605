//! PostgreSQL audit log repository implementation

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::AuditLogRow;
use crate::repo::{AuditLogRepository, CreateAuditEntry};

/// PostgreSQL audit log repository
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    /// Create a new audit log repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append an entry on an existing connection (usually inside a transaction)
pub(crate) async fn insert_audit(
    conn: &mut PgConnection,
    entry: &CreateAuditEntry,
) -> DbResult<AuditLogRow> {
    let row = sqlx::query_as::<_, AuditLogRow>(
        r#"
        INSERT INTO audit_logs (id, user_id, action, detail)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, action, detail, created_at
        "#,
    )
    .bind(entry.id)
    .bind(entry.user_id)
    .bind(&entry.action)
    .bind(&entry.detail)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    async fn append(&self, entry: CreateAuditEntry) -> DbResult<AuditLogRow> {
        let mut conn = self.pool.acquire().await?;
        insert_audit(&mut conn, &entry).await
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<AuditLogRow>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, user_id, action, detail, created_at
            FROM audit_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
