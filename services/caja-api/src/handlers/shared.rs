//! Shared handler utilities
//!
//! Common validation, metrics, and helper functions used across handlers.

use std::time::Instant;

use axum::http::{header, HeaderMap};
use caja_types::{DocumentType, Plan, TenantId, UserId};

use crate::error::ApiError;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for user-provided strings
const MAX_STRING_LEN: usize = 256;

/// Validate a user-provided string is within safe bounds.
pub fn validate_string_length(value: &str, field_name: &str) -> Result<(), ApiError> {
    if value.len() > MAX_STRING_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_STRING_LEN} chars)"
        )));
    }
    Ok(())
}

pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))
}

pub fn parse_tenant_id(raw: &str) -> Result<TenantId, ApiError> {
    TenantId::parse(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid tenant_id".to_string()))
}

/// Parse a document type path segment; unknown types never reach storage
pub fn parse_document_type(raw: &str) -> Result<DocumentType, ApiError> {
    validate_string_length(raw, "document_type")?;
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown document type: {raw}")))
}

pub fn parse_plan(raw: &str) -> Result<Plan, ApiError> {
    validate_string_length(raw, "plan")?;
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid plan: {raw}")))
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "caja_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_validate_string_length() {
        assert!(validate_string_length("short", "test").is_ok());

        let long_string = "a".repeat(MAX_STRING_LEN + 1);
        assert!(validate_string_length(&long_string, "test").is_err());
    }

    #[test]
    fn test_parse_document_type() {
        assert_eq!(parse_document_type("SALE").unwrap(), DocumentType::Sale);
        assert_eq!(parse_document_type("credit-note").unwrap(), DocumentType::CreditNote);
        assert!(parse_document_type("INVOICE").is_err());
        assert!(parse_document_type(&"S".repeat(300)).is_err());
    }

    #[test]
    fn test_parse_ids() {
        let id = UserId::new();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
        assert!(parse_user_id("42").is_err());
        assert!(parse_tenant_id("").is_err());
    }

    #[test]
    fn test_parse_plan() {
        assert_eq!(parse_plan("monthly").unwrap(), Plan::Monthly);
        assert_eq!(parse_plan("ANNUAL").unwrap(), Plan::Annual);
        assert!(parse_plan("weekly").is_err());
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
