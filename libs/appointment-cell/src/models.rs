// libs/appointment-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A booked, free or cancelled slot on a schedule day.
///
/// Neither the calendar date nor the end time is stored here: the date comes from
/// the owning schedule day and the end is `start + schedule.appointment_interval`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub schedule_day_id: Uuid,
    pub time: NaiveTime,
    pub patient_id: Option<Uuid>,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub insurance_type: InsuranceType,
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_services: BTreeMap<String, bool>,
}

impl Appointment {
    /// Returns a copy with every field present in `update` replaced. An explicit `null`
    /// clears `patient_id` and `reason`.
    /// Validation-only attributes (patient/referral types) are not part of the record.
    pub fn with_update(&self, update: &UpdateAppointmentRequest) -> Self {
        Self {
            id: self.id,
            schedule_day_id: update.schedule_day_id.unwrap_or(self.schedule_day_id),
            time: update.time.unwrap_or(self.time),
            patient_id: update.patient_id.unwrap_or(self.patient_id),
            status: self.status,
            appointment_type: update.appointment_type.unwrap_or(self.appointment_type),
            insurance_type: update.insurance_type.unwrap_or(self.insurance_type),
            reason: update.reason.clone().unwrap_or_else(|| self.reason.clone()),
            additional_services: update
                .additional_services
                .clone()
                .unwrap_or_else(|| self.additional_services.clone()),
        }
    }

    pub fn with_status(&self, status: AppointmentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn with_patient(&self, patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..self.clone()
        }
    }
}

/// Insert payload; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub schedule_day_id: Uuid,
    pub time: NaiveTime,
    pub patient_id: Option<Uuid>,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub insurance_type: InsuranceType,
    pub reason: Option<String>,
    pub additional_services: BTreeMap<String, bool>,
}

impl NewAppointment {
    pub fn into_appointment(self, id: i64) -> Appointment {
        Appointment {
            id,
            schedule_day_id: self.schedule_day_id,
            time: self.time,
            patient_id: self.patient_id,
            status: self.status,
            appointment_type: self.appointment_type,
            insurance_type: self.insurance_type,
            reason: self.reason,
            additional_services: self.additional_services,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Free,
    Booked,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Free => write!(f, "free"),
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    #[serde(alias = "consult")]
    Consultation,
    #[serde(alias = "repeat", alias = "follow_up")]
    RepeatVisit,
    Procedure,
    Diagnostics,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Consultation => write!(f, "consultation"),
            AppointmentType::RepeatVisit => write!(f, "repeat_visit"),
            AppointmentType::Procedure => write!(f, "procedure"),
            AppointmentType::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

// ==============================================================================
// CAPABILITY-GATED ATTRIBUTES
// ==============================================================================

/// Payment category of the visit. Also the key into a doctor's `served_payment_types`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum InsuranceType {
    Gobmp,
    Osms,
    Dms,
    Paid,
}

impl InsuranceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceType::Gobmp => "GOBMP",
            InsuranceType::Osms => "OSMS",
            InsuranceType::Dms => "DMS",
            InsuranceType::Paid => "PAID",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatientType {
    Adult,
    Child,
}

impl PatientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientType::Adult => "adult",
            PatientType::Child => "child",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferralType {
    WithReferral,
    WithoutReferral,
}

impl ReferralType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralType::WithReferral => "with_referral",
            ReferralType::WithoutReferral => "without_referral",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferralOrigin {
    Polyclinic,
    Hospital,
    SelfReferral,
}

impl ReferralOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralOrigin::Polyclinic => "polyclinic",
            ReferralOrigin::Hospital => "hospital",
            ReferralOrigin::SelfReferral => "self_referral",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(InsuranceType, PatientType, ReferralType, ReferralOrigin);

// ==============================================================================
// SCHEDULE MODELS (read-only to this cell)
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub schedule_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub is_active: bool,
    /// Slot length in minutes.
    pub appointment_interval: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: i32,
    pub is_active: bool,
    pub work_start_time: NaiveTime,
    pub work_end_time: NaiveTime,
    pub break_start_time: Option<NaiveTime>,
    pub break_end_time: Option<NaiveTime>,
}

impl ScheduleDay {
    pub fn break_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        match (self.break_start_time, self.break_end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

// ==============================================================================
// PEOPLE
// ==============================================================================

/// What a practitioner accepts. Each map is `type key -> accepted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorCapabilities {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub served_patient_types: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub served_referral_types: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub served_referral_origins: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub served_payment_types: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    #[serde(flatten)]
    pub capabilities: DoctorCapabilities,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
}

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub time: NaiveTime,
    pub patient_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub insurance_type: InsuranceType,
    pub reason: Option<String>,
    pub additional_services: Option<BTreeMap<String, bool>>,
    /// Defaults to `booked`; slots are materialized when taken.
    pub status: Option<AppointmentStatus>,
    pub patient_type: Option<PatientType>,
    pub referral_type: Option<ReferralType>,
    pub referral_origin: Option<ReferralOrigin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub schedule_day_id: Option<Uuid>,
    pub time: Option<NaiveTime>,
    /// Absent leaves the patient alone, `null` detaches it.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_id: Option<Option<Uuid>>,
    #[serde(rename = "type")]
    pub appointment_type: Option<AppointmentType>,
    pub insurance_type: Option<InsuranceType>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub reason: Option<Option<String>>,
    pub additional_services: Option<BTreeMap<String, bool>>,
    pub patient_type: Option<PatientType>,
    pub referral_type: Option<ReferralType>,
    pub referral_origin: Option<ReferralOrigin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Option<Uuid>,
}

/// Optional capability-gated attributes of a create or update request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestedCapabilities {
    pub patient_type: Option<PatientType>,
    pub referral_type: Option<ReferralType>,
    pub referral_origin: Option<ReferralOrigin>,
    pub insurance_type: Option<InsuranceType>,
}

impl From<&CreateAppointmentRequest> for RequestedCapabilities {
    fn from(request: &CreateAppointmentRequest) -> Self {
        Self {
            patient_type: request.patient_type,
            referral_type: request.referral_type,
            referral_origin: request.referral_origin,
            insurance_type: Some(request.insurance_type),
        }
    }
}

impl From<&UpdateAppointmentRequest> for RequestedCapabilities {
    fn from(request: &UpdateAppointmentRequest) -> Self {
        Self {
            patient_type: request.patient_type,
            referral_type: request.referral_type,
            referral_origin: request.referral_origin,
            insurance_type: request.insurance_type,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodQuery {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Appointment enriched with the values derived from its schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub date: NaiveDate,
    pub end_time: NaiveTime,
    /// "Last First Middle", as shown on the registry desk.
    pub doctor_name: String,
    pub doctor: Doctor,
    pub patient: Option<Patient>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment with ID: {0} not found")]
    NotFound(i64),

    #[error("Schedule day with ID {0} not found")]
    ScheduleDayNotFound(Uuid),

    #[error("Schedule with ID {0} not found")]
    ScheduleNotFound(Uuid),

    #[error("Doctor with ID: {0} not found")]
    DoctorNotFound(Uuid),

    #[error("Patient with ID: {0} not found")]
    PatientNotFound(Uuid),

    #[error("{0}")]
    ScheduleNotActive(String),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("The selected appointment slot is already booked")]
    Overlapping,

    #[error("{0}")]
    UnsupportedCapability(String),

    #[error("The entry is not available for booking")]
    NotAvailable,

    #[error("Only reserved appointments can be cancelled")]
    NotBooked,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, bool>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing field (`None` via `default`).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
