//! # Error Handling Middleware
//!
//! Maps [`BookingError`] to HTTP status codes and a JSON body of the form
//! `{"error": "...", "kind": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lessonbook_core::errors::BookingError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping.
///
/// Handlers return `Result<_, AppError>` and use `?` on service calls:
///
/// ```
/// use axum::Json;
/// use lessonbook_api::middleware::error_handling::AppError;
/// use lessonbook_core::errors::BookingError;
///
/// fn lookup(id: u32) -> Result<u32, BookingError> {
///     Err(BookingError::NotFound(format!("Booking with ID {} not found", id)))
/// }
///
/// async fn handler() -> Result<Json<u32>, AppError> {
///     Ok(Json(lookup(42)?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Conflict(_) | BookingError::InvalidState(_) | BookingError::Duplicate(_) => {
                StatusCode::CONFLICT
            }
            BookingError::QuotaExhausted(_) | BookingError::NotSubscribed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            BookingError::Storage(report) => {
                error!("Storage failure: {:?}", report);
                // internals stay in the log
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message, "kind": self.0.kind() }));
        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Storage(err))
    }
}
