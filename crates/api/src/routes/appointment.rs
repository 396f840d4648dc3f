use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/appointments",
            post(handlers::appointment::create_appointment),
        )
        .route(
            "/api/appointments",
            get(handlers::appointment::list_appointments),
        )
        .route(
            "/api/appointments/reconcile",
            post(handlers::appointment::reconcile_appointments),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::appointment::get_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(handlers::appointment::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/reschedule",
            post(handlers::appointment::reschedule_appointment),
        )
}
