//! A JSON body that may be left out entirely.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use lessonbook_core::errors::BookingError;
use serde::de::DeserializeOwned;

use crate::middleware::error_handling::AppError;

/// Like [`axum::Json`], except that an empty body yields `T::default()`.
/// A body that is present must be JSON that parses as `T`, else 400.
#[derive(Debug, Clone, Default)]
pub struct OptionalJson<T>(pub T);

fn rejected(message: String) -> AppError {
    AppError(BookingError::Validation(message))
}

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().contains("json"));

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| rejected(format!("Unreadable request body: {}", e)))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }
        if !is_json {
            return Err(rejected(
                "Request body must be sent as application/json".to_string(),
            ));
        }

        serde_json::from_slice(&body)
            .map(OptionalJson)
            .map_err(|e| rejected(format!("Invalid request body: {}", e)))
    }
}
