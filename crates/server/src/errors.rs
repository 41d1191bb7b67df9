use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// Error body shared by every endpoint: `{"error": title, "message": detail}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: impl Into<String>) -> Self {
        Self { status, title, detail: detail.into() }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", detail)
    }

    fn internal(detail: String) -> Self {
        error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", detail)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.title, "message": self.detail });
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let detail = e.to_string();
        match e {
            ServiceError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation", detail),
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "NotFound", detail),
            ServiceError::Conflict(_) => Self::new(StatusCode::CONFLICT, "Conflict", detail),
            ServiceError::Db(_) => Self::internal(detail),
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        let detail = e.to_string();
        match e {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation", detail),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", detail),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "NotFound", detail),
            AuthError::Unauthorized => Self::unauthorized(detail),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                Self::internal(format!("[{}] {}", e.code(), detail))
            }
        }
    }
}

/// Malformed bodies and path segments answer with the JSON error shape.
impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self {
        if matches!(r, JsonRejection::MissingJsonContentType(_)) {
            return Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, "UnsupportedMediaType", r.body_text());
        }
        Self::new(StatusCode::BAD_REQUEST, "Validation", r.body_text())
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation", r.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database unavailable: {0}")]
    Database(String),
}
