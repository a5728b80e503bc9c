use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use super::validate_request;
use crate::{
    app_state::AppState,
    error::{AppJson, Result},
    middleware::TenantContext,
    models::{
        common::SuccessResponse,
        credits::{AdjustCreditsRequest, CreditBalance, CreditEventRecord, CreditHistoryQuery},
    },
};

/// GET /api/v1/students/{id}/credits
#[instrument(skip(state, tenant))]
pub async fn get_balance(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<CreditBalance>>> {
    let balance = state
        .credits_service
        .get_balance(tenant.organization_id, student_id)
        .await?;

    Ok(Json(SuccessResponse::new(balance)))
}

/// POST /api/v1/students/{id}/credits/adjust
#[instrument(skip(state, tenant, request))]
pub async fn adjust_credits(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
    AppJson(request): AppJson<AdjustCreditsRequest>,
) -> Result<Json<SuccessResponse<CreditBalance>>> {
    tenant.require_admin()?;
    validate_request(&request)?;

    let balance = state
        .credits_service
        .adjust_manual(
            tenant.organization_id,
            student_id,
            request.amount,
            &request.reason,
            Some(tenant.user_id),
        )
        .await?;

    Ok(Json(SuccessResponse::new(balance)))
}

/// GET /api/v1/students/{id}/credits/history
#[instrument(skip(state, tenant))]
pub async fn credit_history(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(student_id): Path<Uuid>,
    Query(query): Query<CreditHistoryQuery>,
) -> Result<Json<SuccessResponse<Vec<CreditEventRecord>>>> {
    let events = state
        .credits_service
        .history(tenant.organization_id, student_id, query.limit)
        .await?;

    Ok(Json(SuccessResponse::new(events)))
}
