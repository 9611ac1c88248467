//! # Availability Handlers
//!
//! Teachers manage their own weekly slots under `/api/teacher/availability`
//! and clear a whole weekday under `/api/teacher/days/:day/availability`.
//! Free-slot search is split in two: a public search by instrument and a
//! student view that derives the instruments from the student's active
//! packages.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use lessonbook_core::{
    errors::BookingError,
    models::{
        identity::Role,
        schedule::{
            AddAvailabilityRequest, AvailableSlot, DayRange, DeletedDayResponse, TeacherSchedule,
        },
    },
    services::availability,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

/// Optional weekday bounds, inclusive. `from=jumat&to=senin` wraps over the
/// weekend.
#[derive(Debug, Default, Deserialize)]
pub struct DayRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn day_range(from: Option<&str>, to: Option<&str>) -> Result<DayRange, AppError> {
    Ok(DayRange::parse(from, to)?)
}

#[derive(Debug, Default, Deserialize)]
pub struct FreeSlotsQuery {
    /// Comma-separated instrument UUIDs
    #[serde(default)]
    pub instrument_ids: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_instrument_ids(raw: &str) -> Result<Vec<Uuid>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Uuid::parse_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| {
            AppError(BookingError::Validation(
                "Invalid instrument_ids. Must be comma-separated UUIDs".to_string(),
            ))
        })
}

#[axum::debug_handler]
pub async fn list_own_schedules(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<TeacherSchedule>>, AppError> {
    user.require(&[Role::Teacher])?;
    Ok(Json(
        availability::list_teacher_schedules(state.store.as_ref(), user.user_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn add_availability(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(payload): Json<AddAvailabilityRequest>,
) -> Result<(StatusCode, Json<TeacherSchedule>), AppError> {
    let schedule = availability::add_availability(state.store.as_ref(), &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    availability::delete_availability(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn delete_availability_for_day(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(day): Path<String>,
) -> Result<Json<DeletedDayResponse>, AppError> {
    Ok(Json(
        availability::delete_availability_for_day(state.store.as_ref(), &user, &day).await?,
    ))
}

#[axum::debug_handler]
pub async fn list_free_slots(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Vec<TeacherSchedule>>, AppError> {
    let instrument_ids = parse_instrument_ids(&query.instrument_ids)?;
    let days = day_range(query.from.as_deref(), query.to.as_deref())?;

    let slots = availability::list_free_slots_for_instruments(
        state.store.as_ref(),
        &instrument_ids,
        days,
    )
    .await?;
    Ok(Json(slots.collect()))
}

#[axum::debug_handler]
pub async fn list_bookable_slots(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Query(query): Query<DayRangeQuery>,
) -> Result<Json<Vec<AvailableSlot>>, AppError> {
    user.require(&[Role::Student])?;
    let days = day_range(query.from.as_deref(), query.to.as_deref())?;

    Ok(Json(
        availability::list_bookable_slots(state.store.as_ref(), &state.policy, user.user_id, days)
            .await?,
    ))
}
