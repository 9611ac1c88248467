use axum::{
    body::to_bytes,
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use lessonbook_api::middleware::{
    auth::{USER_ID_HEADER, USER_ROLE_HEADER},
    error_handling::AppError,
};
use lessonbook_core::{errors::BookingError, models::identity::Role};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;

use crate::test_utils::{TestApp, identity};

#[rstest]
#[case::validation(BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST)]
#[case::unauthenticated(BookingError::Unauthenticated("who".into()), StatusCode::UNAUTHORIZED)]
#[case::forbidden(BookingError::Forbidden("no".into()), StatusCode::FORBIDDEN)]
#[case::not_found(BookingError::NotFound("gone".into()), StatusCode::NOT_FOUND)]
#[case::conflict(BookingError::Conflict("taken".into()), StatusCode::CONFLICT)]
#[case::invalid_state(BookingError::InvalidState("done".into()), StatusCode::CONFLICT)]
#[case::duplicate(BookingError::Duplicate("twice".into()), StatusCode::CONFLICT)]
#[case::quota_exhausted(BookingError::QuotaExhausted("empty".into()), StatusCode::UNPROCESSABLE_ENTITY)]
#[case::not_subscribed(BookingError::NotSubscribed("none".into()), StatusCode::UNPROCESSABLE_ENTITY)]
#[case::storage(BookingError::Storage(eyre::eyre!("disk on fire")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: BookingError, #[case] expected: StatusCode) {
    let response = AppError(error).into_response();
    assert_eq!(response.status(), expected);
}

#[tokio::test]
async fn test_error_body_carries_message_and_kind() {
    let response = AppError(BookingError::Conflict("Schedule is already booked".into())).into_response();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["error"], "Conflict: Schedule is already booked");
    assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn test_storage_details_stay_server_side() {
    let response = AppError(BookingError::Storage(eyre::eyre!("password=hunter2"))).into_response();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["kind"], "storage");
    assert!(!body["error"].as_str().unwrap().contains("hunter2"));
}

#[tokio::test]
async fn test_missing_identity_is_unauthenticated() {
    let app = TestApp::new();

    let response = app.server.get("/api/student/bookings").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "unauthenticated");
}

#[rstest]
#[case::bad_uuid("not-a-uuid", "student")]
#[case::unknown_role("7f1c1e0e-6a52-4a8e-9d3f-0b5f4f3c2a10", "janitor")]
#[tokio::test]
async fn test_malformed_identity_is_unauthenticated(#[case] user_id: &str, #[case] role: &str) {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/student/bookings")
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(user_id).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_str(role).unwrap(),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_role_is_forbidden() {
    let app = TestApp::new();
    let teacher = identity(Role::Teacher);

    let response = app.get("/api/student/bookings", &teacher).await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_legacy_management_role_is_accepted() {
    let app = TestApp::new();
    let student = identity(Role::Student);

    let response = app
        .server
        .get(&format!("/api/students/{}/packages", student.user_id))
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from_static("management"),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, serde_json::json!([]));
}
