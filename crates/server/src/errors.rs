use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::{remote::RemoteErrorKind, ServiceError};
use tracing::error;

/// JSON error body: `{"error": title, "detail": message}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let (status, title) = match (&e, e.kind()) {
            (ServiceError::Validation(_), _) => (StatusCode::BAD_REQUEST, "Validation Error"),
            (ServiceError::Config(_), _) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error"),
            (_, Some(RemoteErrorKind::NotFound)) => (StatusCode::NOT_FOUND, "Not Found"),
            (_, Some(RemoteErrorKind::Conflict)) => (StatusCode::CONFLICT, "Conflict"),
            _ => (StatusCode::BAD_GATEWAY, "Upstream Error"),
        };
        Self::new(status, title, Some(e.to_string()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "request failed");
        }
        let body = serde_json::json!({ "error": self.title, "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}
