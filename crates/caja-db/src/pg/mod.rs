//! PostgreSQL repository implementations

mod audit;
mod coupon;
mod sequence;
mod subscription;

pub use audit::PgAuditLogRepository;
pub use coupon::PgCouponRepository;
pub use sequence::PgSequenceRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub sequences: PgSequenceRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub coupons: PgCouponRepository,
    pub audit_logs: PgAuditLogRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            sequences: PgSequenceRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            coupons: PgCouponRepository::new(pool.clone()),
            audit_logs: PgAuditLogRepository::new(pool),
        }
    }
}
