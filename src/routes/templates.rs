use axum::{
    extract::{Path, State},
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
        common::SuccessResponse,
        templates::{GenerationReport, SavedTemplate, TemplateRequest, TemplateResponse},
    },
};

/// GET /api/v1/templates
#[instrument(skip(state, tenant))]
pub async fn list_templates(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<SuccessResponse<Vec<TemplateResponse>>>> {
    let templates = state
        .template_service
        .list_templates(tenant.organization_id)
        .await?;

    Ok(Json(SuccessResponse::new(templates)))
}

/// POST /api/v1/templates
#[instrument(skip(state, tenant, request))]
pub async fn create_template(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<TemplateRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<SavedTemplate>>)> {
    validate_request(&request)?;

    let saved = state
        .template_service
        .create_template(tenant.organization_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(saved))))
}

/// GET /api/v1/templates/{id}
#[instrument(skip(state, tenant))]
pub async fn get_template(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(template_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<TemplateResponse>>> {
    let template = state
        .template_service
        .get_template(tenant.organization_id, template_id)
        .await?;

    Ok(Json(SuccessResponse::new(template)))
}

/// PUT /api/v1/templates/{id}
#[instrument(skip(state, tenant, request))]
pub async fn update_template(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(template_id): Path<Uuid>,
    AppJson(request): AppJson<TemplateRequest>,
) -> Result<Json<SuccessResponse<SavedTemplate>>> {
    validate_request(&request)?;

    let saved = state
        .template_service
        .update_template(tenant.organization_id, template_id, request)
        .await?;

    Ok(Json(SuccessResponse::new(saved)))
}

/// DELETE /api/v1/templates/{id}
#[instrument(skip(state, tenant))]
pub async fn delete_template(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(template_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<GenerationReport>>> {
    let report = state
        .template_service
        .delete_template(tenant.organization_id, template_id)
        .await?;

    Ok(Json(SuccessResponse::new(report)))
}

/// POST /api/v1/templates/{id}/generate
#[instrument(skip(state, tenant))]
pub async fn generate_classes(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(template_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<GenerationReport>>> {
    let report = state
        .template_service
        .generate_classes(tenant.organization_id, template_id)
        .await?;

    Ok(Json(SuccessResponse::new(report)))
}
