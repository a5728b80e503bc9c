use axum::{extract::State, http::StatusCode, Json};
use entity::sea_orm_active_enums::MemberRole;
use tracing::instrument;

use super::validate_request;
use crate::{
    app_state::AppState,
    error::{ApiError, AppJson, Result},
    middleware::{TenantContext, UserIdentity},
    models::{
        common::SuccessResponse,
        organizations::{
            AddMemberRequest, CreateOrganizationRequest, MemberResponse, OrganizationResponse,
            UpdateOrganizationRequest,
        },
    },
};

/// POST /api/v1/organizations
#[instrument(skip(state, identity, request))]
pub async fn create_organization(
    State(state): State<AppState>,
    identity: UserIdentity,
    AppJson(request): AppJson<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<OrganizationResponse>>)> {
    validate_request(&request)?;

    let org = state
        .organization_service
        .create_organization(identity.user_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(OrganizationResponse::from_parts(
            org,
            Some(MemberRole::Owner),
        ))),
    ))
}

/// GET /api/v1/organization
#[instrument(skip(state, tenant))]
pub async fn get_organization(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<SuccessResponse<OrganizationResponse>>> {
    let org = state
        .organization_service
        .get_organization(tenant.organization_id)
        .await?;

    Ok(Json(SuccessResponse::new(OrganizationResponse::from_parts(
        org,
        Some(tenant.role),
    ))))
}

/// PATCH /api/v1/organization
#[instrument(skip(state, tenant, request))]
pub async fn update_organization(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<UpdateOrganizationRequest>,
) -> Result<Json<SuccessResponse<OrganizationResponse>>> {
    tenant.require_admin()?;
    validate_request(&request)?;

    let org = state
        .organization_service
        .update_settings(tenant.organization_id, request)
        .await?;

    Ok(Json(SuccessResponse::new(OrganizationResponse::from_parts(
        org,
        Some(tenant.role),
    ))))
}

/// POST /api/v1/organization/members
#[instrument(skip(state, tenant, request))]
pub async fn add_member(
    State(state): State<AppState>,
    tenant: TenantContext,
    AppJson(request): AppJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<MemberResponse>>)> {
    tenant.require_admin()?;
    if request.role == MemberRole::Owner && tenant.role != MemberRole::Owner {
        return Err(ApiError::Forbidden(
            "Only owners can grant the owner role".to_string(),
        ));
    }

    let member = state
        .organization_service
        .add_member(tenant.organization_id, request.user_id, request.role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(MemberResponse::from(member))),
    ))
}
