//! Back-office handlers (coupons, audit log)
//!
//! Every route requires `Authorization: Bearer <ADMIN_TOKEN>`. Without a
//! configured token the routes answer 404.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use caja_core::constant_time_eq;
use caja_types::{AuditEntry, Coupon, CouponStatus};
use serde::Deserialize;

use super::shared::{bearer_token, parse_plan, parse_user_id, record_op_duration, validate_string_length};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    /// Explicit code; generated when absent
    pub code: Option<String>,
    pub coupon_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCouponsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/admin/coupons
pub async fn create_coupon(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCouponRequest>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    authorize(&state, &headers)?;
    let start = Instant::now();

    let coupon_type = parse_plan(&req.coupon_type)?;
    if let Some(code) = &req.code {
        validate_string_length(code, "code")?;
    }

    let result = state
        .coupons
        .create(req.code.as_deref(), coupon_type, None)
        .await;
    record_op_duration("create_coupon", start, result.is_ok());

    Ok((StatusCode::CREATED, Json(result?)))
}

/// GET /api/v1/admin/coupons?status=&limit=
pub async fn list_coupons(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListCouponsQuery>,
) -> ApiResult<Json<Vec<Coupon>>> {
    authorize(&state, &headers)?;

    let status = query
        .status
        .as_deref()
        .map(str::parse::<CouponStatus>)
        .transpose()
        .map_err(|_| ApiError::BadRequest("status must be 'active' or 'used'".to_string()))?;

    let coupons = state
        .coupons
        .list(status, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    Ok(Json(coupons))
}

/// GET /api/v1/admin/users/{user_id}/audit?limit=
pub async fn user_audit_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditEntry>>> {
    authorize(&state, &headers)?;

    let user_id = parse_user_id(&user_id)?;
    let entries = state
        .audit
        .for_user(&user_id, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;

    Ok(Json(entries))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(ApiError::NotFound);
    };

    match bearer_token(headers) {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => {
            tracing::warn!("Rejected back-office request with missing or wrong token");
            Err(ApiError::Unauthorized)
        }
    }
}
