use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;

/// Handler error: a `DomainError` rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::NotFound => StatusCode::NOT_FOUND,
            DomainError::Validation(_)
            | DomainError::InvalidLookupParameters(_)
            | DomainError::Import(_) => StatusCode::BAD_REQUEST,
            DomainError::PermissionDenied => StatusCode::FORBIDDEN,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Protected(_) => StatusCode::CONFLICT,
            DomainError::Database(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.0 {
            DomainError::Validation(errors) => {
                (status, Json(json!({ "errors": errors }))).into_response()
            }
            DomainError::Database(msg) | DomainError::Internal(msg) => {
                tracing::error!("Request failed: {}", msg);
                (status, Json(json!({ "error": "Internal server error" }))).into_response()
            }
            DomainError::Unauthorized => (
                status,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response(),
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
