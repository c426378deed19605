//! Subscription engine configuration

use crate::lifecycle::DEFAULT_GRACE_PERIOD_DAYS;

/// Subscription engine configuration
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Days of continued access after a subscription ends
    pub grace_period_days: u32,
    /// Prefix of generated coupon codes
    pub coupon_code_prefix: String,
}

impl SubscriptionConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            coupon_code_prefix: "CAJA".to_string(),
        }
    }

    /// Set grace period length
    pub fn with_grace_period_days(mut self, days: u32) -> Self {
        self.grace_period_days = days;
        self
    }

    /// Set prefix for generated coupon codes
    pub fn with_coupon_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.coupon_code_prefix = prefix.into();
        self
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self::new()
    }
}
