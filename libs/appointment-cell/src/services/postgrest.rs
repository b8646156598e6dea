// libs/appointment-cell/src/services/postgrest.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::PaginationParams;

use crate::models::{
    Appointment, AppointmentError, Doctor, NewAppointment, Patient, Schedule, ScheduleDay,
};
use crate::services::store::{
    AppointmentStore, DoctorCapabilityLookup, PatientLookup, ScheduleDayLookup, ScheduleLookup,
};

const DOCTOR_COLUMNS: &str = "id,first_name,last_name,middle_name,served_patient_types,\
served_referral_types,served_referral_origins,served_payment_types";

/// Registry tables exposed through Supabase PostgREST.
#[derive(Clone)]
pub struct SupabaseRegistry {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseRegistry {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    async fn fetch_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, AppointmentError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse rows: {}", e)))
    }

    async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, AppointmentError> {
        Ok(self.fetch_all(path).await?.into_iter().next())
    }

    /// Writes return the affected rows so the caller sees store-assigned values.
    async fn write(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(method, path, body, Some(headers))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    fn period_filter(schedule_id: Uuid, period_start: NaiveDate, period_end: NaiveDate) -> String {
        format!(
            "schedule_days.schedule_id=eq.{}&schedule_days.date=gte.{}&schedule_days.date=lte.{}",
            schedule_id, period_start, period_end
        )
    }
}

#[async_trait]
impl ScheduleDayLookup for SupabaseRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<ScheduleDay>, AppointmentError> {
        debug!("Fetching schedule day {}", id);
        self.fetch_one(&format!("/rest/v1/schedule_days?id=eq.{}&limit=1", id)).await
    }
}

#[async_trait]
impl ScheduleLookup for SupabaseRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Schedule>, AppointmentError> {
        debug!("Fetching schedule {}", id);
        self.fetch_one(&format!("/rest/v1/schedules?id=eq.{}&limit=1", id)).await
    }

    async fn get_by_day_id(&self, schedule_day_id: Uuid) -> Result<Option<Schedule>, AppointmentError> {
        debug!("Fetching schedule for day {}", schedule_day_id);
        self.fetch_one(&format!(
            "/rest/v1/schedules?select=*,schedule_days!inner(id)&schedule_days.id=eq.{}&limit=1",
            schedule_day_id
        ))
        .await
    }
}

#[async_trait]
impl DoctorCapabilityLookup for SupabaseRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Doctor>, AppointmentError> {
        debug!("Fetching doctor {}", id);
        self.fetch_one(&format!("/rest/v1/users?id=eq.{}&select={}&limit=1", id, DOCTOR_COLUMNS))
            .await
    }
}

#[async_trait]
impl PatientLookup for SupabaseRegistry {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Patient>, AppointmentError> {
        debug!("Fetching patient {}", id);
        self.fetch_one(&format!(
            "/rest/v1/patients?id=eq.{}&select=id,first_name,last_name,middle_name&limit=1",
            id
        ))
        .await
    }
}

#[async_trait]
impl AppointmentStore for SupabaseRegistry {
    async fn get_by_id(&self, id: i64) -> Result<Option<Appointment>, AppointmentError> {
        self.fetch_one(&format!("/rest/v1/appointments?id=eq.{}&limit=1", id)).await
    }

    async fn list_by_day(&self, schedule_day_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch_all(&format!(
            "/rest/v1/appointments?schedule_day_id=eq.{}&order=time.asc",
            schedule_day_id
        ))
        .await
    }

    async fn list_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
        pagination: PaginationParams,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?select=*,schedule_days!inner(schedule_id,date)&{}\
             &order=schedule_days(date).asc,time.asc&limit={}&offset={}",
            Self::period_filter(schedule_id, period_start, period_end),
            pagination.limit,
            pagination.offset()
        );
        self.fetch_all(&path).await
    }

    async fn count_by_schedule_and_period(
        &self,
        schedule_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<u64, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?select=id,schedule_days!inner(schedule_id,date)&{}",
            Self::period_filter(schedule_id, period_start, period_end)
        );
        self.supabase
            .count(&path)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    async fn add(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError> {
        let body = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let created = self
            .write(Method::POST, "/rest/v1/appointments", Some(body))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        info!("Appointment {} stored for day {}", created.id, created.schedule_day_id);
        Ok(created)
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let body = json!({
            "schedule_day_id": appointment.schedule_day_id,
            "time": appointment.time,
            "patient_id": appointment.patient_id,
            "status": appointment.status,
            "type": appointment.appointment_type,
            "insurance_type": appointment.insurance_type,
            "reason": appointment.reason,
            "additional_services": appointment.additional_services,
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        self.write(Method::PATCH, &path, Some(body))
            .await?
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound(appointment.id))
    }

    async fn delete(&self, id: i64) -> Result<(), AppointmentError> {
        let deleted = self
            .write(Method::DELETE, &format!("/rest/v1/appointments?id=eq.{}", id), None)
            .await?;

        if deleted.is_empty() {
            return Err(AppointmentError::NotFound(id));
        }

        info!("Appointment {} deleted", id);
        Ok(())
    }
}
