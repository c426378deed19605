//! PostgreSQL document sequence repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::DocumentSequenceRow;
use crate::repo::SequenceRepository;

/// PostgreSQL document sequence repository
#[derive(Clone)]
pub struct PgSequenceRepository {
    pool: PgPool,
}

impl PgSequenceRepository {
    /// Create a new sequence repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceRepository for PgSequenceRepository {
    async fn increment(
        &self,
        tenant_id: Uuid,
        document_type: &str,
        prefix: &str,
    ) -> DbResult<DocumentSequenceRow> {
        // Single statement: the row lock taken by ON CONFLICT serializes
        // concurrent callers, each of which sees its own post-increment value.
        let row = sqlx::query_as::<_, DocumentSequenceRow>(
            r#"
            INSERT INTO document_sequences (tenant_id, document_type, prefix, current_number)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (tenant_id, document_type)
            DO UPDATE SET current_number = document_sequences.current_number + 1,
                          updated_at = NOW()
            RETURNING tenant_id, document_type, prefix, current_number, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(document_type)
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find(
        &self,
        tenant_id: Uuid,
        document_type: &str,
    ) -> DbResult<Option<DocumentSequenceRow>> {
        let row = sqlx::query_as::<_, DocumentSequenceRow>(
            r#"
            SELECT tenant_id, document_type, prefix, current_number, updated_at
            FROM document_sequences
            WHERE tenant_id = $1 AND document_type = $2
            "#,
        )
        .bind(tenant_id)
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
