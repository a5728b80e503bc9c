use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
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
        common::{DateRangeQuery, MessageResponse, SuccessResponse},
        finance::{
            CreateTransactionRequest, FinancialSummary, TransactionListQuery, TransactionResponse,
        },
    },
};

/// GET /api/v1/transactions
#[instrument(skip(state, tenant))]
pub async fn list_transactions(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<SuccessResponse<Vec<TransactionResponse>>>> {
    let transactions = state
        .finance_service
        .list_transactions(tenant.organization_id, &query)
        .await?;

    Ok(Json(SuccessResponse::new(
        transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    )))
}

/// POST /api/v1/transactions
#[instrument(skip(state, tenant, request))]
pub async fn create_transaction(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<TransactionResponse>>)> {
    validate_request(&request)?;

    let tx = state
        .finance_service
        .create_transaction(tenant.organization_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(TransactionResponse::from(tx))),
    ))
}

/// GET /api/v1/transactions/summary
#[instrument(skip(state, tenant))]
pub async fn summary(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<SuccessResponse<FinancialSummary>>> {
    let summary = state
        .finance_service
        .summary(tenant.organization_id, range.from, range.to)
        .await?;

    Ok(Json(SuccessResponse::new(summary)))
}

/// DELETE /api/v1/transactions/{id}
#[instrument(skip(state, tenant))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<MessageResponse>>> {
    tenant.require_admin()?;

    state
        .finance_service
        .delete_transaction(tenant.organization_id, transaction_id)
        .await?;

    Ok(Json(SuccessResponse::new(MessageResponse::new(
        "Transaction deleted",
    ))))
}
