use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/student/bookings",
            get(handlers::booking::student_bookings).post(handlers::booking::create_booking),
        )
        .route(
            "/api/student/bookings/:id/reschedule",
            put(handlers::booking::reschedule_booking),
        )
        .route(
            "/api/student/bookings/:id/cancel",
            put(handlers::booking::cancel_booking),
        )
        .route("/api/teacher/bookings", get(handlers::booking::teacher_bookings))
        .route(
            "/api/teacher/bookings/:id/cancel",
            put(handlers::booking::cancel_booking),
        )
        .route(
            "/api/teacher/bookings/:id/finish",
            put(handlers::booking::finish_class),
        )
}
