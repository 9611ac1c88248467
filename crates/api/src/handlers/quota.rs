use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lessonbook_core::{
    models::{
        identity::Role,
        quota::{AssignPackageRequest, ModifyQuotaRequest, StudentPackage, StudentPackageResponse},
    },
    services::quota,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn assign_package(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(student_id): Path<Uuid>,
    Json(payload): Json<AssignPackageRequest>,
) -> Result<(StatusCode, Json<StudentPackage>), AppError> {
    let entry = quota::assign_package(
        state.store.as_ref(),
        &state.policy,
        &user,
        student_id,
        payload.package_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[axum::debug_handler]
pub async fn modify_quota(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path((student_id, package_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ModifyQuotaRequest>,
) -> Result<Json<StudentPackage>, AppError> {
    Ok(Json(
        quota::modify_quota(state.store.as_ref(), &user, student_id, package_id, payload.delta)
            .await?,
    ))
}

/// Packages of the acting student, expired ones included.
#[axum::debug_handler]
pub async fn own_packages(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<StudentPackageResponse>>, AppError> {
    user.require(&[Role::Student])?;
    Ok(Json(
        quota::student_packages(state.store.as_ref(), user.user_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn student_packages(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<Vec<StudentPackageResponse>>, AppError> {
    user.require(&[Role::Admin, Role::Manager])?;
    Ok(Json(
        quota::student_packages(state.store.as_ref(), student_id).await?,
    ))
}
