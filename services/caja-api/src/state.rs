//! Application state for the Caja API service.

use std::sync::Arc;

use caja_core::{AuditTrail, CouponService, DocumentSequencer, PaymentWebhookVerifier, SubscriptionEngine};
use caja_db::pg::{
    PgAuditLogRepository, PgCouponRepository, PgSequenceRepository, PgSubscriptionRepository,
    Repositories,
};
use caja_db::DbPool;

use crate::config::Config;

pub type Sequencer = DocumentSequencer<PgSequenceRepository>;
pub type Engine = SubscriptionEngine<PgSubscriptionRepository, PgCouponRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Document numbering
    pub sequencer: Arc<Sequencer>,
    /// Subscription gate, checkout, payments and redemption
    pub engine: Arc<Engine>,
    /// Back-office coupon issuing
    pub coupons: Arc<CouponService<PgCouponRepository>>,
    /// Back-office audit reads
    pub audit: Arc<AuditTrail<PgAuditLogRepository>>,
    /// Payment webhook signature verification
    pub webhooks: Arc<PaymentWebhookVerifier>,
    /// Database pool (readiness probe)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire services onto the repositories
    pub fn new(repos: Repositories, pool: DbPool, config: Config) -> Self {
        let engine = SubscriptionEngine::new(
            &config.subscription,
            Arc::new(repos.subscriptions),
            Arc::new(repos.coupons.clone()),
        );
        let coupons = CouponService::new(&config.subscription, Arc::new(repos.coupons));

        Self {
            sequencer: Arc::new(DocumentSequencer::new(Arc::new(repos.sequences))),
            engine: Arc::new(engine),
            coupons: Arc::new(coupons),
            audit: Arc::new(AuditTrail::new(Arc::new(repos.audit_logs))),
            webhooks: Arc::new(PaymentWebhookVerifier::new(config.webhook_secret.clone())),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
