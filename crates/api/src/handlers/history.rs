use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lessonbook_core::{
    models::{
        history::{AddDocumentationRequest, ClassDocumentation, ClassHistory},
        identity::Role,
    },
    services::history,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::AuthUser, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn student_history(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<ClassHistory>>, AppError> {
    user.require(&[Role::Student])?;
    Ok(Json(
        history::student_history(state.store.as_ref(), user.user_id).await?,
    ))
}

#[axum::debug_handler]
pub async fn teacher_history(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<ClassHistory>>, AppError> {
    user.require(&[Role::Teacher])?;
    Ok(Json(
        history::teacher_history(state.store.as_ref(), user.user_id).await?,
    ))
}

/// Every teacher's archive, for admins and managers.
#[axum::debug_handler]
pub async fn all_histories(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<Vec<ClassHistory>>, AppError> {
    Ok(Json(history::all_histories(state.store.as_ref(), &user).await?))
}

#[axum::debug_handler]
pub async fn add_documentation(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddDocumentationRequest>,
) -> Result<(StatusCode, Json<ClassDocumentation>), AppError> {
    let documentation =
        history::add_documentation(state.store.as_ref(), &user, id, &payload.url).await?;
    Ok((StatusCode::CREATED, Json(documentation)))
}
