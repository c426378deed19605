//! Error types for the Caja API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use caja_core::{SequenceError, SubscriptionError, WebhookError};
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Document numbering failed")]
    Sequence(#[from] SequenceError),

    #[error("Subscription error")]
    Subscription(#[from] SubscriptionError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::Webhook(_) => StatusCode::BAD_REQUEST,
            Self::Sequence(e) => match e {
                SequenceError::UnknownTenant(_) => StatusCode::NOT_FOUND,
                SequenceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                SequenceError::CorruptCounter(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Subscription(e) => match e {
                SubscriptionError::InvalidCoupon | SubscriptionError::SubscriptionNotFound => {
                    StatusCode::NOT_FOUND
                }
                SubscriptionError::AlreadyUsed | SubscriptionError::DuplicateCoupon(_) => {
                    StatusCode::CONFLICT
                }
                SubscriptionError::InvalidCouponCode(_)
                | SubscriptionError::InvalidPaymentMethod => StatusCode::BAD_REQUEST,
                SubscriptionError::Database(db) if db.is_transient() => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                SubscriptionError::Database(_) | SubscriptionError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Webhook(_) => "WEBHOOK_ERROR",
            Self::Sequence(e) => match e {
                SequenceError::UnknownTenant(_) => "TENANT_NOT_FOUND",
                SequenceError::StorageUnavailable(_) => "SEQUENCE_UNAVAILABLE",
                SequenceError::CorruptCounter(_) => "INTERNAL_ERROR",
            },
            Self::Subscription(e) => match e {
                SubscriptionError::InvalidCoupon => "INVALID_COUPON",
                SubscriptionError::AlreadyUsed => "COUPON_ALREADY_USED",
                SubscriptionError::InvalidCouponCode(_) => "INVALID_COUPON_CODE",
                SubscriptionError::DuplicateCoupon(_) => "DUPLICATE_COUPON",
                SubscriptionError::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
                SubscriptionError::InvalidPaymentMethod => "INVALID_PAYMENT_METHOD",
                SubscriptionError::Database(db) if db.is_transient() => "SERVICE_UNAVAILABLE",
                SubscriptionError::Database(_) | SubscriptionError::Internal(_) => "INTERNAL_ERROR",
            },
        }
    }

    /// Message safe to show the caller; storage details stay in the logs
    fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::SERVICE_UNAVAILABLE => {
                "Service temporarily unavailable, retry later".to_string()
            }
            _ => match self {
                Self::Sequence(e) => e.to_string(),
                Self::Subscription(e) => e.to_string(),
                other => other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
