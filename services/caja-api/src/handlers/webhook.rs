//! Payment webhook handler

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use caja_core::WebhookError;

use super::shared::record_op_duration;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Header carrying `t=<unix>,v1=<hex hmac>`
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// POST /webhooks/payment
///
/// Events that need no action are acknowledged with 200 so the processor
/// stops retrying; storage failures answer 5xx so it retries later.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let start = Instant::now();

    let event = match verify(&state, &headers, &body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Payment webhook rejected");
            metrics::counter!("caja_webhooks_processed_total", "status" => "rejected")
                .increment(1);
            return Err(e.into());
        }
    };

    let result = state.engine.apply_payment_event(&event).await;
    record_op_duration("payment_webhook", start, result.is_ok());

    match result {
        Ok(activated) => {
            let status = if activated.is_some() { "applied" } else { "ignored" };
            metrics::counter!("caja_webhooks_processed_total", "status" => status).increment(1);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(error = ?e, event_id = %event.id, "Payment webhook processing failed");
            metrics::counter!("caja_webhooks_processed_total", "status" => "error").increment(1);
            Err(ApiError::from(e))
        }
    }
}

fn verify(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<caja_core::PaymentEvent, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(WebhookError::MissingSignature)?
        .to_str()
        .map_err(|_| WebhookError::MissingSignature)?;

    state.webhooks.verify_and_parse(body, signature)
}
