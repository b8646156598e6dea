use std::collections::BTreeMap;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, AppointmentType, InsuranceType, NewAppointment,
};
use appointment_cell::services::postgrest::SupabaseRegistry;
use appointment_cell::services::store::{
    AppointmentStore, DoctorCapabilityLookup, ScheduleDayLookup, ScheduleLookup,
};
use shared_config::AppConfig;

fn registry_for(server: &MockServer) -> SupabaseRegistry {
    SupabaseRegistry::new(&AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_service_token: Some("test-service-token".to_string()),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
    })
}

fn appointment_row(id: i64, schedule_day_id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "schedule_day_id": schedule_day_id,
        "time": "10:00:00",
        "patient_id": null,
        "status": "booked",
        "type": "consultation",
        "insurance_type": "GOBMP",
        "reason": null,
        "additional_services": null
    })
}

#[tokio::test]
async fn test_schedule_day_lookup_parses_row() {
    let server = MockServer::start().await;
    let day_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedule_days"))
        .and(query_param("id", format!("eq.{}", day_id)))
        .and(header("apikey", "test-anon-key"))
        .and(header("authorization", "Bearer test-service-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": day_id,
            "schedule_id": Uuid::new_v4(),
            "date": "2024-05-06",
            "day_of_week": 1,
            "is_active": true,
            "work_start_time": "09:00:00",
            "work_end_time": "18:00:00",
            "break_start_time": "13:00:00",
            "break_end_time": null
        }])))
        .mount(&server)
        .await;

    let day = ScheduleDayLookup::get_by_id(&registry_for(&server), day_id)
        .await
        .unwrap()
        .expect("schedule day");

    assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
    assert_eq!(day.work_end_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    // Half-configured break is no break.
    assert_eq!(day.break_window(), None);
}

#[tokio::test]
async fn test_missing_schedule_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let schedule = ScheduleLookup::get_by_id(&registry_for(&server), Uuid::new_v4())
        .await
        .unwrap();

    assert!(schedule.is_none());
}

#[tokio::test]
async fn test_doctor_capabilities_tolerate_null_maps() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": doctor_id,
            "first_name": "Aigerim",
            "last_name": "Nurlanova",
            "middle_name": "Serikovna",
            "served_patient_types": {"adult": true, "child": false},
            "served_referral_types": null,
            "served_referral_origins": {},
            "served_payment_types": {"GOBMP": true}
        }])))
        .mount(&server)
        .await;

    let doctor = DoctorCapabilityLookup::get_by_id(&registry_for(&server), doctor_id)
        .await
        .unwrap()
        .expect("doctor");

    assert_eq!(doctor.full_name(), "Nurlanova Aigerim Serikovna");
    assert_eq!(doctor.capabilities.served_patient_types.get("adult"), Some(&true));
    assert!(doctor.capabilities.served_referral_types.is_empty());
    assert_eq!(doctor.capabilities.served_payment_types.get("GOBMP"), Some(&true));
}

#[tokio::test]
async fn test_add_returns_store_assigned_id() {
    let server = MockServer::start().await;
    let day_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment_row(42, day_id)])))
        .expect(1)
        .mount(&server)
        .await;

    let created = registry_for(&server)
        .add(NewAppointment {
            schedule_day_id: day_id,
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            patient_id: None,
            status: AppointmentStatus::Booked,
            appointment_type: AppointmentType::Consultation,
            insurance_type: InsuranceType::Gobmp,
            reason: None,
            additional_services: BTreeMap::new(),
        })
        .await
        .unwrap();

    assert_eq!(created.id, 42);
    assert_eq!(created.status, AppointmentStatus::Booked);
    assert!(created.additional_services.is_empty());
}

#[tokio::test]
async fn test_list_by_day_filters_on_schedule_day() {
    let server = MockServer::start().await;
    let day_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("schedule_day_id", format!("eq.{}", day_id)))
        .and(query_param("order", "time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(1, day_id),
            appointment_row(2, day_id)
        ])))
        .mount(&server)
        .await;

    let rows = registry_for(&server).list_by_day(day_id).await.unwrap();

    assert_eq!(rows.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/7")
                .set_body_json(json!([{"id": 1}])),
        )
        .mount(&server)
        .await;

    let total = registry_for(&server)
        .count_by_schedule_and_period(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(total, 7);
}

#[tokio::test]
async fn test_update_and_delete_of_missing_row_are_not_found() {
    let server = MockServer::start().await;
    let day_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let stale = serde_json::from_value(appointment_row(9, day_id)).unwrap();

    assert_matches!(registry.update(stale).await, Err(AppointmentError::NotFound(9)));
    assert_matches!(registry.delete(9).await, Err(AppointmentError::NotFound(9)));
}

#[tokio::test]
async fn test_server_error_maps_to_database_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = AppointmentStore::get_by_id(&registry_for(&server), 1).await;

    assert_matches!(result, Err(AppointmentError::DatabaseError(_)));
}
