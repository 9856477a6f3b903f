use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use pomoloot_shared::ClaimError;
use pomoloot_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("No rewards available. Keep tracking time!")]
    NothingToClaim { progress: f64 },

    #[error("{0}")]
    Unavailable(String),

    #[error("Catalog fetch failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Build a store error mapper that names the missing record.
    pub fn store(what: &'static str) -> impl Fn(StoreError) -> ApiError {
        move |err| match err {
            StoreError::NotFound => ApiError::NotFound(format!("{what} not found")),
            other => ApiError::from(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Record not found".into()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Invalid(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::NotFound(_) => ApiError::NotFound("Activity not found".into()),
            ClaimError::NothingToClaim { progress } => ApiError::NothingToClaim { progress },
            ClaimError::GenerationUnavailable(_) => ApiError::Unavailable(err.to_string()),
            ClaimError::InvalidTimeEntry(_) | ClaimError::Storage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) | ApiError::NothingToClaim { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Upstream(detail) => {
                tracing::warn!(error = %detail, "catalog fetch failed");
                (StatusCode::BAD_GATEWAY, "Catalog fetch failed".to_string())
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = match &self {
            ApiError::NothingToClaim { progress } => serde_json::json!({
                "error": message,
                "next_reward_progress": progress,
            }),
            _ => serde_json::json!({
                "error": message,
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
