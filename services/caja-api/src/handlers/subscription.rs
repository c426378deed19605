//! Subscription gate, checkout and coupon redemption handlers

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use caja_core::Evaluation;
use caja_types::{Subscription, SubscriptionId};
use serde::Deserialize;

use super::shared::{parse_plan, parse_user_id, record_op_duration, validate_string_length};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub plan: String,
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct RedeemCouponRequest {
    pub user_id: String,
    pub code: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/subscription/status?user_id=
///
/// Always answers 200; storage trouble shows up as `blocked`.
pub async fn subscription_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Evaluation>> {
    let start = Instant::now();

    let user_id = parse_user_id(&query.user_id)?;
    let evaluation = state.engine.evaluate(&user_id).await;

    record_op_duration("subscription_status", start, true);
    Ok(Json(evaluation))
}

/// POST /api/v1/subscription/checkout
pub async fn start_checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    let plan = parse_plan(&req.plan)?;
    validate_string_length(&req.payment_method, "payment_method")?;

    let result = state
        .engine
        .start_checkout(&user_id, plan, &req.payment_method)
        .await;
    record_op_duration("start_checkout", start, result.is_ok());

    Ok((StatusCode::CREATED, Json(result?)))
}

/// POST /api/v1/subscriptions/{id}/confirm
///
/// Manual confirmation for back-office and test environments. Answers 404
/// unless enabled in configuration.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    if !state.config.manual_confirmation_enabled {
        return Err(ApiError::NotFound);
    }
    let start = Instant::now();

    let subscription_id = SubscriptionId::parse(id.trim())
        .map_err(|_| ApiError::BadRequest("Invalid subscription id".to_string()))?;

    let result = state.engine.confirm_payment(&subscription_id).await;
    record_op_duration("confirm_payment", start, result.is_ok());

    Ok(Json(result?))
}

/// POST /api/v1/coupons/redeem
pub async fn redeem_coupon(
    State(state): State<AppState>,
    Json(req): Json<RedeemCouponRequest>,
) -> ApiResult<Json<Subscription>> {
    let start = Instant::now();

    let user_id = parse_user_id(&req.user_id)?;
    validate_string_length(&req.code, "code")?;
    if req.code.trim().is_empty() {
        return Err(ApiError::BadRequest("Coupon code is required".to_string()));
    }

    let result = state.engine.redeem_coupon(&user_id, &req.code).await;
    record_op_duration("redeem_coupon", start, result.is_ok());

    Ok(Json(result?))
}
