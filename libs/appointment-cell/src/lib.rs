pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, AppointmentType,
    CreateAppointmentRequest, InsuranceType, UpdateAppointmentRequest,
};
pub use router::appointment_routes;
pub use services::AppointmentBookingService;
