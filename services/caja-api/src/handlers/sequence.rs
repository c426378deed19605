//! Document number handlers

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use caja_types::DocumentType;
use serde::Serialize;

use super::shared::{parse_document_type, parse_tenant_id, record_op_duration};
use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub tenant_id: String,
    pub document_type: DocumentType,
    pub number: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentNumberResponse {
    pub tenant_id: String,
    pub document_type: DocumentType,
    /// Last issued number, `null` before the first one
    pub number: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/tenants/{tenant_id}/sequences/{document_type}/next
pub async fn next_document_number(
    State(state): State<AppState>,
    Path((tenant_id, document_type)): Path<(String, String)>,
) -> ApiResult<Json<NextNumberResponse>> {
    let start = Instant::now();

    let tenant_id = parse_tenant_id(&tenant_id)?;
    let document_type = parse_document_type(&document_type)?;

    let result = state.sequencer.next_number(&tenant_id, document_type).await;
    record_op_duration("next_document_number", start, result.is_ok());
    let number = result?;

    Ok(Json(NextNumberResponse {
        tenant_id: tenant_id.to_string(),
        document_type,
        number,
    }))
}

/// GET /api/v1/tenants/{tenant_id}/sequences/{document_type}
pub async fn current_document_number(
    State(state): State<AppState>,
    Path((tenant_id, document_type)): Path<(String, String)>,
) -> ApiResult<Json<CurrentNumberResponse>> {
    let tenant_id = parse_tenant_id(&tenant_id)?;
    let document_type = parse_document_type(&document_type)?;

    let number = state
        .sequencer
        .current_number(&tenant_id, document_type)
        .await?;

    Ok(Json(CurrentNumberResponse {
        tenant_id: tenant_id.to_string(),
        document_type,
        number,
    }))
}
