//! Document number generation
//!
//! Hands out gap-free, strictly increasing numbers per (tenant, document
//! type). The increment happens in storage as one atomic statement, so any
//! number of server instances can call this concurrently.

use std::sync::Arc;

use caja_db::{DbError, DocumentSequenceRow, SequenceRepository};
use caja_types::{format_document_number, DocumentType, TenantId};
use tracing::{debug, error, instrument};

use crate::SequenceError;

/// Document sequence generator
#[derive(Clone)]
pub struct DocumentSequencer<R: SequenceRepository> {
    repo: Arc<R>,
}

impl<R: SequenceRepository> DocumentSequencer<R> {
    /// Create a new sequencer
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Issue the next number for `document_type`, e.g. `VTA-000042`.
    ///
    /// The counter row is created on first use. Errors must abort the
    /// caller's business operation: a document must never be stored without
    /// its number.
    #[instrument(skip(self))]
    pub async fn next_number(
        &self,
        tenant_id: &TenantId,
        document_type: DocumentType,
    ) -> Result<String, SequenceError> {
        let row = self
            .repo
            .increment(tenant_id.0, document_type.as_str(), document_type.prefix())
            .await
            .map_err(|e| classify(e, tenant_id))?;

        let formatted = format_row(&row)?;

        metrics::counter!("caja_documents_issued_total", "document_type" => document_type.as_str())
            .increment(1);
        debug!(number = %formatted, "Issued document number");

        Ok(formatted)
    }

    /// Last issued number, without issuing a new one
    #[instrument(skip(self))]
    pub async fn current_number(
        &self,
        tenant_id: &TenantId,
        document_type: DocumentType,
    ) -> Result<Option<String>, SequenceError> {
        let row = self
            .repo
            .find(tenant_id.0, document_type.as_str())
            .await
            .map_err(|e| classify(e, tenant_id))?;

        match row {
            Some(row) if row.current_number > 0 => format_row(&row).map(Some),
            _ => Ok(None),
        }
    }
}

fn format_row(row: &DocumentSequenceRow) -> Result<String, SequenceError> {
    let number = row
        .number()
        .map_err(|e| SequenceError::CorruptCounter(e.to_string()))?;
    Ok(format_document_number(&row.prefix, number))
}

fn classify(err: DbError, tenant_id: &TenantId) -> SequenceError {
    match err {
        DbError::ForeignKeyViolation(_) => SequenceError::UnknownTenant(*tenant_id),
        other => {
            error!(error = %other, "Document sequence storage failure");
            SequenceError::StorageUnavailable(other)
        }
    }
}

impl<R: SequenceRepository> std::fmt::Debug for DocumentSequencer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSequencer").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn row(prefix: &str, n: i64) -> DocumentSequenceRow {
        DocumentSequenceRow {
            tenant_id: Uuid::new_v4(),
            document_type: "SALE".to_string(),
            prefix: prefix.to_string(),
            current_number: n,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_row_uses_stored_prefix() {
        assert_eq!(format_row(&row("VTA-", 42)).unwrap(), "VTA-000042");
        assert_eq!(format_row(&row("A1-", 7)).unwrap(), "A1-000007");
    }

    #[test]
    fn test_format_row_rejects_negative() {
        assert!(matches!(
            format_row(&row("VTA-", -3)),
            Err(SequenceError::CorruptCounter(_))
        ));
    }

    #[test]
    fn test_classify_foreign_key_as_unknown_tenant() {
        let tenant = TenantId::new();
        let err = classify(DbError::ForeignKeyViolation("fk_tenant".into()), &tenant);
        assert!(matches!(err, SequenceError::UnknownTenant(t) if t == tenant));

        let err = classify(DbError::from(sqlx::Error::PoolTimedOut), &tenant);
        assert!(err.is_retryable());
    }
}
