use axum::{
    Router,
    routing::{get, patch},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/students/:id/packages",
            get(handlers::quota::student_packages).post(handlers::quota::assign_package),
        )
        .route(
            "/api/students/:id/packages/:package_id/quota",
            patch(handlers::quota::modify_quota),
        )
        .route("/api/student/packages", get(handlers::quota::own_packages))
}
