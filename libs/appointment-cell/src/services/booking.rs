// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::pagination::PaginationParams;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, CreateAppointmentRequest,
    Doctor, NewAppointment, Patient, RequestedCapabilities, Schedule, ScheduleDay,
    UpdateAppointmentRequest,
};
use crate::services::capability;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::postgrest::SupabaseRegistry;
use crate::services::slot::{self, SlotWindow};
use crate::services::store::{
    AppointmentStore, DoctorCapabilityLookup, PatientLookup, ScheduleDayLookup, ScheduleLookup,
};

pub struct AppointmentBookingService {
    schedule_days: Arc<dyn ScheduleDayLookup>,
    schedules: Arc<dyn ScheduleLookup>,
    doctors: Arc<dyn DoctorCapabilityLookup>,
    patients: Arc<dyn PatientLookup>,
    appointments: Arc<dyn AppointmentStore>,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(
        schedule_days: Arc<dyn ScheduleDayLookup>,
        schedules: Arc<dyn ScheduleLookup>,
        doctors: Arc<dyn DoctorCapabilityLookup>,
        patients: Arc<dyn PatientLookup>,
        appointments: Arc<dyn AppointmentStore>,
    ) -> Self {
        Self {
            schedule_days,
            schedules,
            doctors,
            patients,
            appointments,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Service backed by the Supabase PostgREST tables.
    pub fn from_config(config: &AppConfig) -> Self {
        let registry = Arc::new(SupabaseRegistry::new(config));
        Self::new(
            registry.clone(),
            registry.clone(),
            registry.clone(),
            registry.clone(),
            registry,
        )
    }

    pub async fn create_appointment(
        &self,
        schedule_day_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<AppointmentDetails, AppointmentError> {
        info!("Creating appointment on day {} at {}", schedule_day_id, request.time);

        let schedule_day = self.load_schedule_day(schedule_day_id).await?;
        let schedule = self.load_schedule_for_day(schedule_day_id).await?;
        Self::ensure_active(&schedule, &schedule_day)?;

        let doctor = self.load_doctor(schedule.doctor_id).await?;
        capability::check_requested(&doctor.capabilities, &RequestedCapabilities::from(&request))?;

        if let Some(patient_id) = request.patient_id {
            self.load_patient(patient_id).await?;
        }

        let window = self
            .validate_slot(&schedule_day, &schedule, request.time, None)
            .await?;

        let new_appointment = NewAppointment {
            schedule_day_id,
            time: request.time,
            patient_id: request.patient_id,
            status: request.status.unwrap_or(AppointmentStatus::Booked),
            appointment_type: request.appointment_type,
            insurance_type: request.insurance_type,
            reason: request.reason,
            additional_services: request.additional_services.unwrap_or_default(),
        };

        let created = self.appointments.add(new_appointment).await?;
        info!(
            "Appointment {} created for {} {}-{}",
            created.id,
            schedule_day.date,
            window.start.time(),
            window.end_time()
        );

        self.details(created, &schedule_day, &schedule, doctor).await
    }

    pub async fn update_appointment(
        &self,
        appointment_id: i64,
        request: UpdateAppointmentRequest,
    ) -> Result<AppointmentDetails, AppointmentError> {
        info!("Updating appointment {}", appointment_id);

        let appointment = self.load_appointment(appointment_id).await?;

        if let Some(Some(patient_id)) = request.patient_id {
            self.load_patient(patient_id).await?;
        }

        let schedule_day_id = request.schedule_day_id.unwrap_or(appointment.schedule_day_id);
        let schedule_day = self.load_schedule_day(schedule_day_id).await?;
        let schedule = self.load_schedule_for_day(schedule_day_id).await?;

        let doctor = self.load_doctor(schedule.doctor_id).await?;
        capability::check_requested(&doctor.capabilities, &RequestedCapabilities::from(&request))?;

        let day_changed = request
            .schedule_day_id
            .is_some_and(|day_id| day_id != appointment.schedule_day_id);
        let time_changed = request.time.is_some_and(|time| time != appointment.time);

        if day_changed || time_changed {
            debug!(
                "Appointment {} moves (day changed: {}, time changed: {}), re-validating",
                appointment_id, day_changed, time_changed
            );
            Self::ensure_active(&schedule, &schedule_day)?;
            let new_time = request.time.unwrap_or(appointment.time);
            self.validate_slot(&schedule_day, &schedule, new_time, Some(appointment.id))
                .await?;
        }

        let updated = self
            .appointments
            .update(appointment.with_update(&request))
            .await?;
        info!("Appointment {} updated", updated.id);

        self.details(updated, &schedule_day, &schedule, doctor).await
    }

    pub async fn get_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<AppointmentDetails, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);
        let appointment = self.load_appointment(appointment_id).await?;
        self.resolve_details(appointment).await
    }

    /// Appointments of a schedule whose date lies in `[period_start, period_end]`,
    /// paginated, together with the total number of matching appointments.
    pub async fn list_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        pagination: PaginationParams,
    ) -> Result<(Vec<AppointmentDetails>, u64), AppointmentError> {
        if period_start > period_end {
            return Err(AppointmentError::ValidationError(format!(
                "period_start {} is after period_end {}",
                period_start, period_end
            )));
        }
        if pagination.limit == 0 {
            return Err(AppointmentError::ValidationError(
                "limit must be greater than zero".to_string(),
            ));
        }

        let schedule = self
            .schedules
            .get_by_id(schedule_id)
            .await?
            .ok_or(AppointmentError::ScheduleNotFound(schedule_id))?;

        let appointments = self
            .appointments
            .list_by_schedule_and_period(schedule_id, period_start, period_end, pagination)
            .await?;
        let total = self
            .appointments
            .count_by_schedule_and_period(schedule_id, period_start, period_end)
            .await?;

        if appointments.is_empty() {
            return Ok((Vec::new(), total));
        }

        let doctor = self.load_doctor(schedule.doctor_id).await?;

        let mut results = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let schedule_day = self.load_schedule_day(appointment.schedule_day_id).await?;
            results.push(
                self.details(appointment, &schedule_day, &schedule, doctor.clone())
                    .await?,
            );
        }

        debug!(
            "Listed {} of {} appointments for schedule {} between {} and {}",
            results.len(),
            total,
            schedule_id,
            period_start,
            period_end
        );
        Ok((results, total))
    }

    /// `free -> booked`, optionally attaching the patient taking the slot.
    pub async fn book_appointment(
        &self,
        appointment_id: i64,
        patient_id: Option<Uuid>,
    ) -> Result<AppointmentDetails, AppointmentError> {
        let appointment = self.load_appointment(appointment_id).await?;
        let booked = self.lifecycle_service.book(&appointment)?;

        let booked = match patient_id {
            Some(patient_id) => {
                self.load_patient(patient_id).await?;
                booked.with_patient(patient_id)
            }
            None => booked,
        };

        let stored = self.appointments.update(booked).await?;
        self.resolve_details(stored).await
    }

    /// `booked -> cancelled`. The slot becomes available to new bookings.
    pub async fn cancel_appointment(
        &self,
        appointment_id: i64,
    ) -> Result<AppointmentDetails, AppointmentError> {
        let appointment = self.load_appointment(appointment_id).await?;
        let cancelled = self.lifecycle_service.cancel(&appointment)?;

        let stored = self.appointments.update(cancelled).await?;
        self.resolve_details(stored).await
    }

    /// Deletes regardless of status.
    pub async fn delete_appointment(&self, appointment_id: i64) -> Result<(), AppointmentError> {
        self.load_appointment(appointment_id).await?;
        self.appointments.delete(appointment_id).await?;
        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// Window, working hours, break and same-day overlap, in that order.
    async fn validate_slot(
        &self,
        schedule_day: &ScheduleDay,
        schedule: &Schedule,
        start_time: chrono::NaiveTime,
        exclude_appointment_id: Option<i64>,
    ) -> Result<SlotWindow, AppointmentError> {
        let window = slot::validate_window(schedule_day, schedule.appointment_interval, start_time)?;

        let existing = self.appointments.list_by_day(schedule_day.id).await?;
        slot::check_overlap(
            &window,
            &existing,
            schedule_day.date,
            schedule.appointment_interval,
            exclude_appointment_id,
        )?;

        Ok(window)
    }

    fn ensure_active(schedule: &Schedule, schedule_day: &ScheduleDay) -> Result<(), AppointmentError> {
        if !schedule.is_active {
            warn!("Schedule {} is inactive", schedule.id);
            return Err(AppointmentError::ScheduleNotActive(
                "Associated schedule is inactive".to_string(),
            ));
        }
        if !schedule_day.is_active {
            warn!("Schedule day {} is inactive", schedule_day.id);
            return Err(AppointmentError::ScheduleNotActive(format!(
                "Schedule day {} is inactive",
                schedule_day.id
            )));
        }
        Ok(())
    }

    async fn load_appointment(&self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        self.appointments
            .get_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(appointment_id))
    }

    async fn load_schedule_day(&self, schedule_day_id: Uuid) -> Result<ScheduleDay, AppointmentError> {
        self.schedule_days
            .get_by_id(schedule_day_id)
            .await?
            .ok_or(AppointmentError::ScheduleDayNotFound(schedule_day_id))
    }

    async fn load_schedule_for_day(&self, schedule_day_id: Uuid) -> Result<Schedule, AppointmentError> {
        self.schedules
            .get_by_day_id(schedule_day_id)
            .await?
            .ok_or(AppointmentError::ScheduleNotFound(schedule_day_id))
    }

    async fn load_doctor(&self, doctor_id: Uuid) -> Result<Doctor, AppointmentError> {
        self.doctors
            .get_by_id(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound(doctor_id))
    }

    async fn load_patient(&self, patient_id: Uuid) -> Result<Patient, AppointmentError> {
        self.patients
            .get_by_id(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound(patient_id))
    }

    async fn resolve_details(&self, appointment: Appointment) -> Result<AppointmentDetails, AppointmentError> {
        let schedule_day = self.load_schedule_day(appointment.schedule_day_id).await?;
        let schedule = self.load_schedule_for_day(appointment.schedule_day_id).await?;
        let doctor = self.load_doctor(schedule.doctor_id).await?;
        self.details(appointment, &schedule_day, &schedule, doctor).await
    }

    async fn details(
        &self,
        appointment: Appointment,
        schedule_day: &ScheduleDay,
        schedule: &Schedule,
        doctor: Doctor,
    ) -> Result<AppointmentDetails, AppointmentError> {
        let patient = match appointment.patient_id {
            Some(patient_id) => self.patients.get_by_id(patient_id).await?,
            None => None,
        };

        let window = SlotWindow::new(schedule_day.date, appointment.time, schedule.appointment_interval)?;

        Ok(AppointmentDetails {
            appointment,
            date: schedule_day.date,
            end_time: window.end_time(),
            doctor_name: doctor.full_name(),
            doctor,
            patient,
        })
    }
}
