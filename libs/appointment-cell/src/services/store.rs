// libs/appointment-cell/src/services/store.rs
//
// Collaborators of the booking service. Production implementations live in
// `services::postgrest`; tests substitute in-memory or mocked ones.

use async_trait::async_trait;
use chrono::NaiveDate;
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use shared_models::pagination::PaginationParams;

use crate::models::{
    Appointment, AppointmentError, Doctor, NewAppointment, Patient, Schedule, ScheduleDay,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScheduleDayLookup: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<ScheduleDay>, AppointmentError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScheduleLookup: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppointmentError>;

    /// The schedule owning the given schedule day.
    async fn get_by_day_id(&self, schedule_day_id: Uuid) -> Result<Option<Schedule>, AppointmentError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DoctorCapabilityLookup: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Doctor>, AppointmentError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PatientLookup: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Patient>, AppointmentError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get_by_id(&self, id: i64) -> Result<Option<Appointment>, AppointmentError>;

    /// All appointments of a schedule day, any status, ordered by start time.
    async fn list_by_day(&self, schedule_day_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    /// Appointments whose schedule day belongs to `schedule_id` and falls within
    /// `[period_start, period_end]`, ordered by date then time.
    async fn list_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        pagination: PaginationParams,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn count_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<u64, AppointmentError>;

    async fn add(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError>;

    async fn update(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn delete(&self, id: i64) -> Result<(), AppointmentError>;
}
