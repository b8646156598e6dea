use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, AppointmentBookingService};

pub fn create_router(booking_service: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .route("/", get(|| async { "Registry API is running!" }))
        .merge(appointment_routes(booking_service))
}
