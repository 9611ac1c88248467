use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lessonbook_core::{
    models::{
        booking::{
            Booking, CancelBookingRequest, CreateBookingRequest, FinishClassRequest,
            RescheduleBookingRequest,
        },
        history::ClassHistory,
        identity::Role,
    },
    services::booking,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, body::OptionalJson, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking =
        booking::create_booking(state.store.as_ref(), &state.policy, &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[axum::debug_handler]
pub async fn student_bookings(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    user.require(&[Role::Student])?;
    Ok(Json(
        booking::student_bookings(state.store.as_ref(), user.user_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn reschedule_booking(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        booking::reschedule_booking(
            state.store.as_ref(),
            &state.policy,
            &user,
            id,
            payload.schedule_id,
        )
        .await?,
    ))
}

#[axum::debug_handler]
pub async fn teacher_bookings(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    user.require(&[Role::Teacher])?;
    Ok(Json(
        booking::teacher_bookings(state.store.as_ref(), user.user_id).await?,
    ))
}

/// Serves both the teacher and the student cancel route. The body is
/// optional; an empty request cancels without a reason.
#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<CancelBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        booking::cancel_booking(state.store.as_ref(), &state.policy, &user, id, request.reason)
            .await?,
    ))
}

#[axum::debug_handler]
pub async fn finish_class(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<FinishClassRequest>,
) -> Result<Json<ClassHistory>, AppError> {
    Ok(Json(
        booking::finish_class(state.store.as_ref(), &user, id, request).await?,
    ))
}
