// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Free => vec![AppointmentStatus::Booked],
            AppointmentStatus::Booked => vec![AppointmentStatus::Cancelled],
            // Terminal; nothing returns to free
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if self.get_valid_transitions(current_status).contains(&new_status) {
            return Ok(());
        }

        warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
        Err(match new_status {
            AppointmentStatus::Cancelled => AppointmentError::NotBooked,
            _ => AppointmentError::NotAvailable,
        })
    }

    /// `free -> booked`. Returns the booked copy; the input is not modified.
    pub fn book(&self, appointment: &Appointment) -> Result<Appointment, AppointmentError> {
        self.transition(appointment, AppointmentStatus::Booked)
    }

    /// `booked -> cancelled`. Returns the cancelled copy; the input is not modified.
    pub fn cancel(&self, appointment: &Appointment) -> Result<Appointment, AppointmentError> {
        self.transition(appointment, AppointmentStatus::Cancelled)
    }

    fn transition(
        &self,
        appointment: &Appointment,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.validate_status_transition(appointment.status, new_status)?;

        info!("Appointment {} is now {}", appointment.id, new_status);
        Ok(appointment.with_status(new_status))
    }
}
