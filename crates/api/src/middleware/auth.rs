//! # Identity Extraction
//!
//! Authentication happens in front of this service. The gateway forwards the
//! authenticated user as two headers, `X-User-Id` (a UUID) and
//! `X-User-Role` (`admin`, `manager`, `teacher` or `student`), and handlers
//! take an [`AuthUser`] to receive them as an
//! [`Identity`](lessonbook_core::models::identity::Identity).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use lessonbook_core::{
    errors::BookingError,
    models::identity::{Identity, Role},
};
use std::ops::Deref;
use uuid::Uuid;

use crate::middleware::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The acting user of a request. Rejects with 401 when either header is
/// missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

impl Deref for AuthUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| unauthenticated(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| unauthenticated(format!("Header {} is not valid text", name)))
}

fn unauthenticated(message: String) -> AppError {
    AppError(BookingError::Unauthenticated(message))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id: Uuid = header(parts, USER_ID_HEADER)?
            .trim()
            .parse()
            .map_err(|_| unauthenticated(format!("Header {} is not a UUID", USER_ID_HEADER)))?;
        let role: Role = header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(|_| unauthenticated(format!("Header {} names no known role", USER_ROLE_HEADER)))?;

        Ok(AuthUser(Identity::new(user_id, role)))
    }
}
