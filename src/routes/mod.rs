// Route modules
pub mod classes;
pub mod credits;
pub mod finance;
pub mod organizations;
pub mod students;
pub mod templates;

use crate::{
    app_state::AppState,
    error::{ApiError, Result},
    middleware::{jwt_auth_middleware, logging_middleware, tenant_middleware},
};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use sea_orm::ConnectionTrait;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use validator::Validate;

/// Run `validator` rules on a request body
pub(crate) fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))
}

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let server = &config.server;

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(middleware::from_fn(logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&server.cors_origins))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(server.request_timeout_secs),
                ))
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    if origins.is_empty() {
        return layer.allow_origin(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Tenant-scoped routes: JWT plus organization membership
    let tenant_routes = Router::new()
        .route(
            "/organization",
            get(organizations::get_organization).patch(organizations::update_organization),
        )
        .route("/organization/members", post(organizations::add_member))
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/birthdays", get(students::birthdays))
        .route(
            "/students/{id}",
            get(students::get_student)
                .patch(students::update_student)
                .delete(students::delete_student),
        )
        .route("/students/{id}/credits", get(credits::get_balance))
        .route("/students/{id}/credits/adjust", post(credits::adjust_credits))
        .route("/students/{id}/credits/history", get(credits::credit_history))
        .route(
            "/classes",
            get(classes::list_classes).post(classes::create_class),
        )
        .route(
            "/classes/{id}",
            get(classes::get_class)
                .patch(classes::update_class)
                .delete(classes::delete_class),
        )
        .route("/classes/{id}/attendees", post(classes::add_attendee))
        .route(
            "/attendees/{id}/status",
            patch(classes::update_attendance_status),
        )
        .route(
            "/attendees/{id}",
            delete(classes::remove_attendee),
        )
        .route(
            "/bookings/reposition-series",
            post(classes::book_reposition_series),
        )
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/templates/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/templates/{id}/generate", post(templates::generate_classes))
        .route(
            "/transactions",
            get(finance::list_transactions).post(finance::create_transaction),
        )
        .route("/transactions/summary", get(finance::summary))
        .route(
            "/transactions/{id}",
            delete(finance::delete_transaction),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_middleware,
        ));

    // Auth-only routes (JWT, no organization yet)
    let auth_only_routes = Router::new()
        .route("/organizations", post(organizations::create_organization))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    Router::new().merge(tenant_routes).merge(auth_only_routes)
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state
        .db
        .execute_unprepared("SELECT 1")
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database probe failed: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
    }))
}
