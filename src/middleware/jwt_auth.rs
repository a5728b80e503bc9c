use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    services::jwt_service::JWTService,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use entity::sea_orm_active_enums::MemberRole;
use uuid::Uuid;

/// Header selecting the organization a request acts on
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Request extension storing verified user identity from JWT
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: Uuid,
    /// Organization named in the token, if any
    pub default_organization: Option<Uuid>,
}

/// Request extension for tenant-scoped routes
///
/// Every service call takes `organization_id` from here explicitly.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
}

fn identity_from_headers(state: &AppState, headers: &HeaderMap) -> Result<UserIdentity> {
    // Extract Authorization header
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    // Parse "Bearer <token>" format
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization format, expected 'Bearer <token>'".to_string(),
        )
    })?;

    let claims = state.jwt_service.validate_token(token)?;

    Ok(UserIdentity {
        user_id: JWTService::user_id_from_claims(&claims)?,
        default_organization: JWTService::organization_from_claims(&claims)?,
    })
}

/// JWT authentication middleware
///
/// Validates the bearer token and stores the verified identity in request
/// extensions. Returns 401 if the header is missing or the token is invalid.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let identity = identity_from_headers(&state, request.headers())?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// JWT authentication plus organization membership
///
/// The organization comes from the `x-organization-id` header, then the
/// token's `org` claim, then the user's earliest membership.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let identity = identity_from_headers(&state, request.headers())?;

    let requested = match request.headers().get(ORGANIZATION_HEADER) {
        Some(value) => {
            let raw = value.to_str().map_err(|_| {
                ApiError::BadRequest("Invalid organization header".to_string())
            })?;
            Some(Uuid::parse_str(raw.trim()).map_err(|_| {
                ApiError::BadRequest(format!("Invalid organization id: {}", raw))
            })?)
        }
        None => identity.default_organization,
    };

    let membership = state
        .organization_service
        .resolve_tenant(identity.user_id, requested)
        .await?;

    let tenant = TenantContext {
        user_id: identity.user_id,
        organization_id: membership.organization_id,
        role: membership.role,
    };

    tracing::debug!(
        user_id = %tenant.user_id,
        organization_id = %tenant.organization_id,
        "Resolved tenant"
    );

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(tenant);

    Ok(next.run(request).await)
}

/// Axum extractor for user identity
///
/// Only works on routes protected by `jwt_auth_middleware` or `tenant_middleware`.
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserIdentity>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "User identity not found - route must be protected by jwt_auth_middleware"
                        .to_string(),
                )
            })
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "Tenant context not found - route must be protected by tenant_middleware"
                        .to_string(),
                )
            })
    }
}

impl TenantContext {
    /// Owners and admins manage settings and credits by hand
    pub fn require_admin(&self) -> Result<()> {
        match self.role {
            MemberRole::Owner | MemberRole::Admin => Ok(()),
            MemberRole::Staff => Err(ApiError::Forbidden(
                "Requires an owner or admin role".to_string(),
            )),
        }
    }
}
