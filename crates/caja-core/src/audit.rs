//! Audit trail queries for the back-office

use std::sync::Arc;

use caja_db::AuditLogRepository;
use caja_types::{AuditEntry, UserId};
use tracing::instrument;

use crate::coupon::MAX_LIST_LIMIT;
use crate::SubscriptionError;

/// Read access to the audit log
pub struct AuditTrail<A: AuditLogRepository> {
    repo: Arc<A>,
}

impl<A: AuditLogRepository> AuditTrail<A> {
    pub fn new(repo: Arc<A>) -> Self {
        Self { repo }
    }

    /// Entries concerning `user_id`, newest first
    #[instrument(skip(self))]
    pub async fn for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<AuditEntry>, SubscriptionError> {
        let rows = self
            .repo
            .find_by_user_id(user_id.0, limit.clamp(1, MAX_LIST_LIMIT))
            .await?;

        rows.into_iter()
            .map(|row| AuditEntry::try_from(row).map_err(SubscriptionError::from))
            .collect()
    }
}

impl<A: AuditLogRepository> std::fmt::Debug for AuditTrail<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditTrail").finish()
    }
}
