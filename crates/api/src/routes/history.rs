use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/admin/history", get(handlers::history::all_histories))
        .route("/api/student/history", get(handlers::history::student_history))
        .route("/api/teacher/history", get(handlers::history::teacher_history))
        .route(
            "/api/teacher/history/:id/documentation",
            post(handlers::history::add_documentation),
        )
}
