use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure reported by the data store; the message reaches the user verbatim
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Insufficient reposition credits for student {student_id}")]
    InsufficientCredits { student_id: Uuid },

    #[error("Class is full: {0}")]
    ClassFull(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable machine-readable code shared by HTTP bodies and batch reports
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "STORE_ERROR",
            ApiError::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            ApiError::ClassFull(_) => "CLASS_FULL_NO_DISPLACEABLE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "NOT_AUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message shown to the user
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Database(e) => e.to_string(),
            ApiError::InsufficientCredits { .. } => {
                "Student has no reposition credits available".to_string()
            }
            ApiError::ClassFull(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InsufficientCredits { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ClassFull(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Database(ref e) => tracing::error!("Database error: {:?}", e),
            ApiError::Internal(ref e) => tracing::error!("Internal error: {:?}", e),
            ref e => tracing::debug!(code = e.code(), "Request rejected: {}", e),
        }

        let body = json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor that reports malformed bodies in the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

// Helper type for results
pub type Result<T> = std::result::Result<T, ApiError>;
