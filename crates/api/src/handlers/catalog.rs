use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lessonbook_core::{
    models::catalog::{
        Instrument, InstrumentRequest, Package, PackageRequest, TeacherInstrumentsRequest,
        TeacherInstrumentsResponse,
    },
    services::catalog,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn list_instruments(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Instrument>>, AppError> {
    Ok(Json(catalog::list_instruments(state.store.as_ref()).await?))
}

#[axum::debug_handler]
pub async fn create_instrument(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(payload): Json<InstrumentRequest>,
) -> Result<(StatusCode, Json<Instrument>), AppError> {
    let instrument = catalog::create_instrument(state.store.as_ref(), &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(instrument)))
}

#[axum::debug_handler]
pub async fn rename_instrument(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstrumentRequest>,
) -> Result<Json<Instrument>, AppError> {
    Ok(Json(
        catalog::rename_instrument(state.store.as_ref(), &user, id, &payload).await?,
    ))
}

#[axum::debug_handler]
pub async fn delete_instrument(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog::delete_instrument(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_packages(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Package>>, AppError> {
    Ok(Json(catalog::list_packages(state.store.as_ref()).await?))
}

#[axum::debug_handler]
pub async fn create_package(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Json(payload): Json<PackageRequest>,
) -> Result<(StatusCode, Json<Package>), AppError> {
    let package = catalog::create_package(state.store.as_ref(), &user, &payload).await?;
    Ok((StatusCode::CREATED, Json(package)))
}

#[axum::debug_handler]
pub async fn update_package(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PackageRequest>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(
        catalog::update_package(state.store.as_ref(), &user, id, &payload).await?,
    ))
}

#[axum::debug_handler]
pub async fn delete_package(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog::delete_package(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_teacher_instruments(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<TeacherInstrumentsResponse>, AppError> {
    let instrument_ids = catalog::teacher_instruments(state.store.as_ref(), teacher_id).await?;
    Ok(Json(TeacherInstrumentsResponse {
        teacher_id,
        instrument_ids,
    }))
}

#[axum::debug_handler]
pub async fn set_teacher_instruments(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(teacher_id): Path<Uuid>,
    Json(payload): Json<TeacherInstrumentsRequest>,
) -> Result<Json<TeacherInstrumentsResponse>, AppError> {
    let instrument_ids = catalog::set_teacher_instruments(
        state.store.as_ref(),
        &user,
        teacher_id,
        &payload.instrument_ids,
    )
    .await?;

    Ok(Json(TeacherInstrumentsResponse {
        teacher_id,
        instrument_ids,
    }))
}
