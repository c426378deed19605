//! Payment webhook verification
//!
//! The processor signs each delivery with
//! `x-payment-signature: t=<unix seconds>,v1=<hex hmac-sha256>` computed over
//! `"<t>.<raw body>"` with the shared webhook secret.

use caja_types::SubscriptionId;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, instrument, warn};

use crate::WebhookError;

/// Default freshness window for signed deliveries
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Payment event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    /// Processor confirmed the payment
    PaymentApproved,
    /// Processor rejected the payment
    PaymentRejected,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for PaymentEventType {
    fn from(s: &str) -> Self {
        match s {
            "payment.approved" => Self::PaymentApproved,
            "payment.rejected" => Self::PaymentRejected,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed payment event
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: PaymentEventType,
    /// Subscription the payment is for
    pub subscription_id: Option<SubscriptionId>,
    /// Processor-side payment status
    pub status: Option<String>,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Verifies and parses signed payment webhooks
#[derive(Clone)]
pub struct PaymentWebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl PaymentWebhookVerifier {
    /// Create a new verifier
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Set the accepted clock skew
    pub fn with_tolerance_secs(mut self, secs: i64) -> Self {
        self.tolerance_secs = secs;
        self
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentEvent, WebhookError> {
        self.verify_signature(payload, signature, Utc::now().timestamp())?;

        let raw: RawPaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        debug!(event_id = %raw.id, event_type = %raw.event_type, "Parsed payment event");

        let subscription_id = raw
            .data
            .subscription_id
            .as_deref()
            .map(SubscriptionId::parse)
            .transpose()
            .map_err(|_| WebhookError::InvalidPayload("invalid subscription_id".to_string()))?;

        Ok(PaymentEvent {
            event_type: PaymentEventType::from(raw.event_type.as_str()),
            id: raw.id,
            subscription_id,
            status: raw.data.status,
            created: raw.created,
        })
    }

    /// Verify a signature header against `payload` at time `now`
    pub fn verify_signature(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<(), WebhookError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.trim().split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            WebhookError::MissingTimestamp
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            WebhookError::MissingSignature
        })?;

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;

        let expected = sign(&self.secret, ts, payload);
        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(WebhookError::InvalidSignature);
        }

        if (now - ts).abs() > self.tolerance_secs {
            warn!(timestamp = ts, now = now, "Webhook timestamp outside tolerance");
            return Err(WebhookError::StaleTimestamp);
        }

        Ok(())
    }
}

impl std::fmt::Debug for PaymentWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentWebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts any key length"),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Full signature header value for `payload`
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={timestamp},v1={}", sign(secret, timestamp, payload))
}

/// Constant-time comparison
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[derive(Debug, Deserialize)]
struct RawPaymentEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: i64,
    data: RawPaymentData,
}

#[derive(Debug, Deserialize)]
struct RawPaymentData {
    subscription_id: Option<String>,
    status: Option<String>,
}
