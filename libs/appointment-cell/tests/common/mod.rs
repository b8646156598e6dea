#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentType, CreateAppointmentRequest, Doctor,
    DoctorCapabilities, InsuranceType, NewAppointment, Patient, Schedule, ScheduleDay,
};
use appointment_cell::services::store::{
    AppointmentStore, DoctorCapabilityLookup, PatientLookup, ScheduleDayLookup, ScheduleLookup,
};
use appointment_cell::AppointmentBookingService;
use shared_models::pagination::PaginationParams;

pub const INTERVAL_MINUTES: i64 = 30;

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Registry tables held in memory, enough to drive the booking service end to end.
#[derive(Default)]
pub struct InMemoryRegistry {
    pub schedule_days: Mutex<Vec<ScheduleDay>>,
    pub schedules: Mutex<Vec<Schedule>>,
    pub doctors: Mutex<Vec<Doctor>>,
    pub patients: Mutex<Vec<Patient>>,
    pub appointments: Mutex<Vec<Appointment>>,
    next_id: AtomicI64,
}

impl InMemoryRegistry {
    pub fn appointment_count(&self) -> usize {
        self.appointments.lock().unwrap().len()
    }

    fn day_of(&self, schedule_day_id: Uuid) -> Option<ScheduleDay> {
        self.schedule_days
            .lock()
            .unwrap()
            .iter()
            .find(|day| day.id == schedule_day_id)
            .cloned()
    }

    fn in_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Vec<(NaiveDate, Appointment)> {
        let mut rows: Vec<(NaiveDate, Appointment)> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter_map(|appointment| {
                let day = self.day_of(appointment.schedule_day_id)?;
                (day.schedule_id == schedule_id
                    && day.date >= period_start
                    && day.date <= period_end)
                    .then(|| (day.date, appointment.clone()))
            })
            .collect();
        rows.sort_by_key(|(date, appointment)| (*date, appointment.time));
        rows
    }
}

#[async_trait]
impl ScheduleDayLookup for InMemoryRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<ScheduleDay>, AppointmentError> {
        Ok(self.day_of(id))
    }
}

#[async_trait]
impl ScheduleLookup for InMemoryRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppointmentError> {
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .iter()
            .find(|schedule| schedule.id == id)
            .cloned())
    }

    async fn get_by_day_id(&self, schedule_day_id: Uuid) -> Result<Option<Schedule>, AppointmentError> {
        match self.day_of(schedule_day_id) {
            Some(day) => ScheduleLookup::get_by_id(self, day.schedule_id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DoctorCapabilityLookup for InMemoryRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Doctor>, AppointmentError> {
        Ok(self
            .doctors
            .lock()
            .unwrap()
            .iter()
            .find(|doctor| doctor.id == id)
            .cloned())
    }
}

#[async_trait]
impl PatientLookup for InMemoryRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Patient>, AppointmentError> {
        Ok(self
            .patients
            .lock()
            .unwrap()
            .iter()
            .find(|patient| patient.id == id)
            .cloned())
    }
}

#[async_trait]
impl AppointmentStore for InMemoryRegistry {
    async fn get_by_id(&self, id: i64) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|appointment| appointment.id == id)
            .cloned())
    }

    async fn list_by_day(&self, schedule_day_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let mut rows: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|appointment| appointment.schedule_day_id == schedule_day_id)
            .cloned()
            .collect();
        rows.sort_by_key(|appointment| appointment.time);
        Ok(rows)
    }

    async fn list_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        pagination: PaginationParams,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .in_period(schedule_id, period_start, period_end)
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .map(|(_, appointment)| appointment)
            .collect())
    }

    async fn count_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<u64, AppointmentError> {
        Ok(self.in_period(schedule_id, period_start, period_end).len() as u64)
    }

    async fn add(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = appointment.into_appointment(id);
        self.appointments.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut rows = self.appointments.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|existing| existing.id == appointment.id)
            .ok_or(AppointmentError::NotFound(appointment.id))?;
        *slot = appointment.clone();
        Ok(appointment)
    }

    async fn delete(&self, id: i64) -> Result<(), AppointmentError> {
        let mut rows = self.appointments.lock().unwrap();
        let before = rows.len();
        rows.retain(|appointment| appointment.id != id);
        if rows.len() == before {
            return Err(AppointmentError::NotFound(id));
        }
        Ok(())
    }
}

/// One active schedule with a 30-minute interval, one working day
/// (09:00-18:00, break 13:00-14:00), its doctor and one patient.
pub struct Seed {
    pub registry: Arc<InMemoryRegistry>,
    pub service: Arc<AppointmentBookingService>,
    pub schedule_id: Uuid,
    pub day_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

impl Seed {
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryRegistry::default());
        let schedule_id = Uuid::new_v4();
        let doctor_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        registry.schedules.lock().unwrap().push(Schedule {
            id: schedule_id,
            doctor_id,
            schedule_name: "Therapist, May".to_string(),
            period_start: d(2024, 5, 1),
            period_end: d(2024, 5, 31),
            is_active: true,
            appointment_interval: INTERVAL_MINUTES,
            description: None,
        });

        registry.doctors.lock().unwrap().push(Doctor {
            id: doctor_id,
            first_name: "Aigerim".to_string(),
            last_name: "Nurlanova".to_string(),
            middle_name: None,
            capabilities: DoctorCapabilities {
                served_patient_types: flags(&[("adult", true), ("child", false)]),
                served_referral_types: flags(&[("with_referral", true), ("without_referral", false)]),
                served_referral_origins: flags(&[("polyclinic", true)]),
                served_payment_types: flags(&[("GOBMP", true), ("PAID", true), ("DMS", false)]),
            },
        });

        registry.patients.lock().unwrap().push(Patient {
            id: patient_id,
            first_name: "Daniyar".to_string(),
            last_name: "Seitkali".to_string(),
            middle_name: None,
        });

        let service = Arc::new(AppointmentBookingService::new(
            registry.clone(),
            registry.clone(),
            registry.clone(),
            registry.clone(),
            registry.clone(),
        ));

        let mut seed = Self {
            registry,
            service,
            schedule_id,
            day_id: Uuid::nil(),
            doctor_id,
            patient_id,
        };
        seed.day_id = seed.add_day(d(2024, 5, 6), true);
        seed
    }

    /// Adds a 09:00-18:00 working day with a 13:00-14:00 break.
    pub fn add_day(&self, date: NaiveDate, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.registry.schedule_days.lock().unwrap().push(ScheduleDay {
            id,
            schedule_id: self.schedule_id,
            date,
            day_of_week: 1,
            is_active,
            work_start_time: t(9, 0),
            work_end_time: t(18, 0),
            break_start_time: Some(t(13, 0)),
            break_end_time: Some(t(14, 0)),
        });
        id
    }
}

pub fn flags(entries: &[(&str, bool)]) -> BTreeMap<String, bool> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

pub fn create_request(time: NaiveTime) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        time,
        patient_id: None,
        appointment_type: AppointmentType::Consultation,
        insurance_type: InsuranceType::Gobmp,
        reason: None,
        additional_services: None,
        status: None,
        patient_type: None,
        referral_type: None,
        referral_origin: None,
    }
}
