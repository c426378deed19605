//! Configuration for the Caja API service.

use std::str::FromStr;
use std::time::Duration;

use caja_core::SubscriptionConfig;
use caja_db::PoolOptions;

/// Caja API configuration
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Connection pool sizing
    pub database: PoolOptions,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
    /// Shared secret for payment webhook signatures
    pub webhook_secret: String,
    /// Expose the manual payment confirmation route
    pub manual_confirmation_enabled: bool,
    /// Bearer token for back-office routes; admin routes are disabled when unset
    pub admin_token: Option<String>,
    /// Subscription engine configuration
    pub subscription: SubscriptionConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"));
        }
        let acquire_timeout_secs = parse_or(&lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5u64)?;
        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        // Server
        let http_port = parse_or(&lookup, "HTTP_PORT", 8080u16)?;
        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let metrics_enabled = parse_or(&lookup, "METRICS_ENABLED", true)?;

        // Payments
        let webhook_secret = lookup("PAYMENT_WEBHOOK_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("PAYMENT_WEBHOOK_SECRET"))?;
        let manual_confirmation_enabled = parse_or(&lookup, "MANUAL_CONFIRMATION_ENABLED", false)?;

        // Back-office
        let admin_token = lookup("ADMIN_TOKEN").filter(|s| !s.is_empty());

        // Subscriptions
        let grace_period_days = parse_or(
            &lookup,
            "GRACE_PERIOD_DAYS",
            caja_core::lifecycle::DEFAULT_GRACE_PERIOD_DAYS,
        )?;
        let mut subscription = SubscriptionConfig::new().with_grace_period_days(grace_period_days);
        if let Some(prefix) = lookup("COUPON_CODE_PREFIX") {
            subscription = subscription.with_coupon_code_prefix(prefix);
        }

        Ok(Self {
            http_port,
            database_url,
            database: PoolOptions {
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            run_migrations,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            webhook_secret,
            manual_confirmation_enabled,
            admin_token,
            subscription,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("http_port", &self.http_port)
            .field("database", &self.database)
            .field("run_migrations", &self.run_migrations)
            .field("request_timeout", &self.request_timeout)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("manual_confirmation_enabled", &self.manual_confirmation_enabled)
            .field("admin_enabled", &self.admin_token.is_some())
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
