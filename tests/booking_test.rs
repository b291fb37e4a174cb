//! Integration tests for appointment booking

mod common;

use std::sync::Arc;

use chrono::NaiveTime;
use common::{appointment_row, today, user, Clinic};
use uuid::Uuid;

use medidash::booking::{demo_doctors, is_demo_doctor, AppointmentForm, BookingOutcome, DoctorSource, TimeSlots};
use medidash::error::MediDashError;
use medidash::fallback::LocalStore;
use medidash::memory::MemoryClient;
use medidash::metrics::MetricsCollector;
use medidash::models::{AppointmentStatus, Role};
use medidash::schema::{appointments, patients};
use medidash::service::HospitalService;
use medidash::validation::REQUIRED_FIELDS_MESSAGE;

fn form(doctor_id: Uuid, hour: u32, minute: u32) -> AppointmentForm {
    AppointmentForm {
        doctor_id: Some(doctor_id),
        appointment_date: today().succ_opt(),
        appointment_time: NaiveTime::from_hms_opt(hour, minute, 0),
        reason: "  Persistent cough ".to_string(),
    }
}

#[tokio::test]
async fn test_booking_writes_scheduled_appointment() {
    let clinic = Clinic::new();
    let service = clinic.service();

    let outcome = service.booking().book(&clinic.patient, &form(clinic.doctor_id, 9, 30), today()).await.unwrap();

    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a backend booking");
    };
    assert_eq!(appointment.patient_id, clinic.patient_id);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.reason.as_deref(), Some("Persistent cough"));
    assert_eq!(appointment.created_by, Some(clinic.patient.id));
    assert_eq!(clinic.client.rows(appointments::TABLE).unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let incomplete = AppointmentForm { appointment_time: None, ..form(clinic.doctor_id, 9, 0) };

    let err = service.booking().book(&clinic.patient, &incomplete, today()).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), REQUIRED_FIELDS_MESSAGE);
    assert!(clinic.client.rows(appointments::TABLE).unwrap().is_empty());
    assert_eq!(service.metrics().snapshot().form_rejections, 1);
}

#[tokio::test]
async fn test_past_date_and_off_grid_slot_are_rejected() {
    let clinic = Clinic::new();
    let service = clinic.service();

    let past = AppointmentForm { appointment_date: today().pred_opt(), ..form(clinic.doctor_id, 9, 0) };
    assert!(service.booking().book(&clinic.patient, &past, today()).await.unwrap_err().is_validation());

    let off_grid = form(clinic.doctor_id, 9, 15);
    let err = service.booking().book(&clinic.patient, &off_grid, today()).await.unwrap_err();
    assert!(err.to_string().contains("09:15 AM"));
}

#[tokio::test]
async fn test_patient_row_is_created_once() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let newcomer = user(None, "grace@example.com");

    service.booking().book(&newcomer, &form(clinic.doctor_id, 10, 0), today()).await.unwrap();
    service.booking().book(&newcomer, &form(clinic.doctor_id, 11, 0), today()).await.unwrap();

    let rows = clinic.client.rows(patients::TABLE).unwrap();
    let mine: Vec<_> = rows
        .iter()
        .filter(|row| row["user_id"] == serde_json::json!(newcomer.id))
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["full_name"], "grace");

    let mine = service.booking().appointments_for_user(&newcomer).await.unwrap();
    assert_eq!(mine.remote.len(), 2);
    assert!(mine.local.is_empty());
}

#[tokio::test]
async fn test_demo_doctor_booking_stays_local() {
    let clinic = Clinic::new();
    let store = Arc::new(LocalStore::temporary().unwrap());
    let service = clinic.service_with_store(Arc::clone(&store));
    let demo = demo_doctors()[0].clone();
    assert!(is_demo_doctor(demo.id));

    let outcome = service.booking().book(&clinic.patient, &form(demo.id, 14, 0), today()).await.unwrap();

    let BookingOutcome::StoredLocally(saved) = outcome else {
        panic!("expected a local booking");
    };
    assert_eq!(saved.doctor_name, demo.full_name);
    assert_eq!(saved.status, AppointmentStatus::Pending);
    assert!(clinic.client.rows(appointments::TABLE).unwrap().is_empty());
    assert_eq!(store.demo_appointments(Some(clinic.patient.id)).unwrap(), vec![saved]);
    assert_eq!(service.metrics().snapshot().fallback_writes, 1);
}

#[tokio::test]
async fn test_demo_doctor_without_store_is_not_found() {
    let clinic = Clinic::new();
    let service = clinic.service();

    let err = service
        .booking()
        .book(&clinic.patient, &form(demo_doctors()[1].id, 14, 0), today())
        .await
        .unwrap_err();

    assert!(matches!(err, MediDashError::NotFound(_)));
}

#[tokio::test]
async fn test_doctor_choices_fall_back_to_demo_catalogue() {
    let clinic = Clinic::new();
    let store = Arc::new(LocalStore::temporary().unwrap());

    // the clinic has a doctor, so the backend list wins
    let choices = clinic.service_with_store(Arc::clone(&store)).booking().doctor_choices().await.unwrap();
    assert_eq!(choices.source, DoctorSource::Remote);
    assert_eq!(choices.doctors.len(), 1);
    assert!(choices.find(clinic.doctor_id).is_some());

    let bare = HospitalService::new(Arc::new(MemoryClient::new()), Some(store), TimeSlots::default(), MetricsCollector::new());
    let choices = bare.booking().doctor_choices().await.unwrap();
    assert_eq!(choices.source, DoctorSource::Demo);
    assert_eq!(choices.doctors, demo_doctors());
}

#[tokio::test]
async fn test_staff_schedule_for_patient() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let receptionist = user(Some(Role::Receptionist), "front@clinic.org");

    let appointment = service
        .booking()
        .schedule_for_patient(&receptionist, clinic.patient_id, &form(clinic.doctor_id, 16, 30), today())
        .await
        .unwrap();
    assert_eq!(appointment.created_by, Some(receptionist.id));

    let err = service
        .booking()
        .schedule_for_patient(&receptionist, Uuid::new_v4(), &form(clinic.doctor_id, 16, 30), today())
        .await
        .unwrap_err();
    assert!(matches!(err, MediDashError::NotFound(_)));

    let err = service
        .booking()
        .schedule_for_patient(&clinic.patient, clinic.patient_id, &form(clinic.doctor_id, 16, 30), today())
        .await
        .unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));
}

#[tokio::test]
async fn test_status_updates_stop_at_terminal_states() {
    let clinic = Clinic::new();
    let row = appointment_row(clinic.patient_id, clinic.doctor_id, "2025-03-05", "09:00:00", "scheduled");
    let id: Uuid = row["id"].as_str().unwrap().parse().unwrap();
    clinic.client.seed(appointments::TABLE, [row]).unwrap();
    let service = clinic.service();

    let done = service.booking().update_status(&clinic.doctor, id, AppointmentStatus::Completed).await.unwrap();
    assert_eq!(done.status, AppointmentStatus::Completed);

    let err = service.booking().update_status(&clinic.doctor, id, AppointmentStatus::Pending).await.unwrap_err();
    assert_eq!(err.to_string(), "Appointment is already completed and cannot be changed");

    let err = service
        .booking()
        .update_status(&clinic.doctor, Uuid::new_v4(), AppointmentStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, MediDashError::NotFound(_)));

    let err = service.booking().update_status(&clinic.patient, id, AppointmentStatus::Cancelled).await.unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));
}

#[tokio::test]
async fn test_admins_confirm_pending_appointments() {
    let clinic = Clinic::new();
    let row = appointment_row(clinic.patient_id, clinic.doctor_id, "2025-03-05", "10:00:00", "pending");
    let id: Uuid = row["id"].as_str().unwrap().parse().unwrap();
    clinic.client.seed(appointments::TABLE, [row]).unwrap();
    let service = clinic.service();

    let admin = user(Some(Role::Admin), "boss@clinic.org");
    let confirmed = service.booking().update_status(&admin, id, AppointmentStatus::Confirmed).await.unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let super_admin = user(Some(Role::SuperAdmin), "root@clinic.org");
    let cancelled = service.booking().update_status(&super_admin, id, AppointmentStatus::Cancelled).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_listings_are_ordered() {
    let clinic = Clinic::new();
    clinic
        .client
        .seed(
            appointments::TABLE,
            [
                appointment_row(clinic.patient_id, clinic.doctor_id, "2025-03-06", "09:00:00", "scheduled"),
                appointment_row(clinic.patient_id, clinic.doctor_id, "2025-03-05", "15:00:00", "scheduled"),
                appointment_row(clinic.patient_id, clinic.doctor_id, "2025-03-05", "10:30:00", "confirmed"),
            ],
        )
        .unwrap();
    let service = clinic.service();

    let all = service.booking().appointments_for_patient(clinic.patient_id).await.unwrap();
    let order: Vec<String> = all.iter().map(|a| format!("{} {}", a.appointment_date, a.appointment_time)).collect();
    assert_eq!(order, ["2025-03-05 10:30:00", "2025-03-05 15:00:00", "2025-03-06 09:00:00"]);

    let day = today().succ_opt().unwrap();
    assert_eq!(service.booking().appointments_for_doctor_on(clinic.doctor_id, day).await.unwrap().len(), 2);
    assert_eq!(service.booking().appointments_on(day).await.unwrap().len(), 2);
}
