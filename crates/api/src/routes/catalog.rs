use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/instruments",
            get(handlers::catalog::list_instruments).post(handlers::catalog::create_instrument),
        )
        .route(
            "/api/instruments/:id",
            put(handlers::catalog::rename_instrument).delete(handlers::catalog::delete_instrument),
        )
        .route(
            "/api/packages",
            get(handlers::catalog::list_packages).post(handlers::catalog::create_package),
        )
        .route(
            "/api/packages/:id",
            put(handlers::catalog::update_package).delete(handlers::catalog::delete_package),
        )
        .route(
            "/api/teachers/:id/instruments",
            get(handlers::catalog::get_teacher_instruments)
                .put(handlers::catalog::set_teacher_instruments),
        )
}
