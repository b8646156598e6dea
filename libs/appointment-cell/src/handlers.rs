// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::pagination::{PaginationMeta, PaginationParams, DEFAULT_LIMIT, DEFAULT_PAGE};

use crate::models::{
    AppointmentError, BookAppointmentRequest, CreateAppointmentRequest, PeriodQuery,
    UpdateAppointmentRequest,
};
use crate::services::booking::AppointmentBookingService;

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        let message = error.to_string();
        match error {
            AppointmentError::NotFound(_)
            | AppointmentError::ScheduleDayNotFound(_)
            | AppointmentError::ScheduleNotFound(_)
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::PatientNotFound(_) => AppError::NotFound(message),
            AppointmentError::ScheduleNotActive(_)
            | AppointmentError::InvalidTime(_)
            | AppointmentError::Overlapping
            | AppointmentError::UnsupportedCapability(_)
            | AppointmentError::NotAvailable
            | AppointmentError::NotBooked => AppError::Conflict(message),
            AppointmentError::ValidationError(_) => AppError::ValidationError(message),
            AppointmentError::DatabaseError(_) => AppError::Database(message),
        }
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(schedule_day_id): Path<Uuid>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = service.create_appointment(schedule_day_id, request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.get_appointment(appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.update_appointment(appointment_id, request).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_appointment(appointment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = service
        .book_appointment(appointment_id, request.patient_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let appointment = service.cancel_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_schedule_appointments(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Value>, AppError> {
    let pagination = PaginationParams {
        page: query.page.unwrap_or(DEFAULT_PAGE),
        limit: query.limit.unwrap_or(DEFAULT_LIMIT),
    };

    let (items, total) = service
        .list_by_schedule_and_period(schedule_id, query.period_start, query.period_end, pagination)
        .await?;

    Ok(Json(json!({
        "items": items,
        "pagination": PaginationMeta::new(pagination, total)
    })))
}
