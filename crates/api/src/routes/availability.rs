use axum::{
    Router,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/schedules/free", get(handlers::availability::list_free_slots))
        .route(
            "/api/teacher/availability",
            get(handlers::availability::list_own_schedules)
                .post(handlers::availability::add_availability),
        )
        .route(
            "/api/teacher/availability/:id",
            delete(handlers::availability::delete_availability),
        )
        .route(
            "/api/teacher/days/:day/availability",
            delete(handlers::availability::delete_availability_for_day),
        )
        .route(
            "/api/student/schedules/available",
            get(handlers::availability::list_bookable_slots),
        )
}
