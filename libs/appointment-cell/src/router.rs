// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::booking::AppointmentBookingService;

pub fn appointment_routes(service: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .route(
            "/schedule-days/{schedule_day_id}/appointments",
            post(handlers::create_appointment),
        )
        .route(
            "/schedules/{schedule_id}/appointments",
            get(handlers::list_schedule_appointments),
        )
        .route(
            "/appointments/{appointment_id}",
            get(handlers::get_appointment)
                .patch(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .route("/appointments/{appointment_id}/book", post(handlers::book_appointment))
        .route("/appointments/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(service)
}
