//! Integration tests for the prescription workflow

mod common;

use async_trait::async_trait;
use common::{doctor_row, today, user, Clinic};
use mockall::mock;
use serde_json::{json, Value};
use uuid::Uuid;

use medidash::error::{MediDashError, Result};
use medidash::models::{Medication, Role};
use medidash::prescription::{PrescriptionForm, PrescriptionService};
use medidash::query::QueryBuilder;
use medidash::repository::DataClient;
use medidash::schema::{doctors, medical_records, prescriptions};
use medidash::metrics::MetricsCollector;

mock! {
    pub Backend {}

    #[async_trait]
    impl DataClient for Backend {
        async fn select(&self, table: &str, query: &QueryBuilder) -> Result<Vec<Value>>;
        async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>>;
        async fn update(&self, table: &str, query: &QueryBuilder, changes: Value) -> Result<Vec<Value>>;
        async fn count(&self, table: &str, query: &QueryBuilder) -> Result<usize>;
    }
}

fn medication(name: &str) -> Medication {
    Medication {
        name: name.to_string(),
        dosage: "250mg".to_string(),
        frequency: "three times daily".to_string(),
        duration: "5 days".to_string(),
    }
}

fn form(patient_id: Uuid) -> PrescriptionForm {
    PrescriptionForm {
        patient_id: Some(patient_id),
        diagnosis: "Bacterial sinusitis".to_string(),
        symptoms: "Facial pain".to_string(),
        instructions: "Take with food".to_string(),
        medications: vec![medication("Amoxicillin"), Medication::default()],
        ..PrescriptionForm::new()
    }
}

#[tokio::test]
async fn test_issue_writes_record_then_prescription() {
    let clinic = Clinic::new();
    let service = clinic.service();

    let issued = service.prescriptions().issue(&clinic.doctor, &form(clinic.patient_id), today()).await.unwrap();

    assert_eq!(issued.record.diagnosis, "Bacterial sinusitis");
    assert_eq!(issued.record.doctor_id, clinic.doctor_id);
    assert_eq!(issued.prescription.medical_record_id, Some(issued.record.id));
    assert_eq!(issued.prescription.medications, vec![medication("Amoxicillin")]);
    assert_eq!(issued.prescription.prescription_date, today());
    assert_eq!(clinic.client.rows(medical_records::TABLE).unwrap().len(), 1);
    assert_eq!(clinic.client.rows(prescriptions::TABLE).unwrap().len(), 1);
}

#[tokio::test]
async fn test_issue_requires_doctor_role() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let nurse = user(Some(Role::Nurse), "joy@clinic.org");

    let err = service.prescriptions().issue(&nurse, &form(clinic.patient_id), today()).await.unwrap_err();

    assert!(matches!(err, MediDashError::Forbidden(_)));
    assert!(clinic.client.rows(medical_records::TABLE).unwrap().is_empty());
}

#[tokio::test]
async fn test_issue_rejects_empty_medication_list() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let mut blank = form(clinic.patient_id);
    blank.medications = vec![Medication::default()];

    let err = service.prescriptions().issue(&clinic.doctor, &blank, today()).await.unwrap_err();

    assert!(err.is_validation());
    assert!(clinic.client.rows(medical_records::TABLE).unwrap().is_empty());
    assert_eq!(service.metrics().snapshot().form_rejections, 1);
}

#[tokio::test]
async fn test_valid_until_cannot_be_past() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let mut expired = form(clinic.patient_id);
    expired.valid_until = today().pred_opt();

    let err = service.prescriptions().issue(&clinic.doctor, &expired, today()).await.unwrap_err();
    assert!(err.to_string().contains("cannot be in the past"));
}

#[tokio::test]
async fn test_failed_prescription_insert_reports_record_id() {
    let doctor = user(Some(Role::Doctor), "house@clinic.org");
    let doctor_id = Uuid::new_v4();
    let record_id = Uuid::new_v4();
    let doctor_user_id = doctor.id;

    let mut backend = MockBackend::new();
    backend
        .expect_select()
        .withf(|table, _| table == doctors::TABLE)
        .returning(move |_, _| Ok(vec![doctor_row(doctor_id, doctor_user_id, "Dr. Gregory House", "Diagnostics")]));
    backend
        .expect_insert()
        .withf(|table, _| table == medical_records::TABLE)
        .times(1)
        .returning(move |_, rows| {
            let mut row = rows[0].clone();
            row["id"] = json!(record_id);
            row["created_at"] = json!("2025-03-04T10:00:00Z");
            row["updated_at"] = json!("2025-03-04T10:00:00Z");
            Ok(vec![row])
        });
    backend
        .expect_insert()
        .withf(|table, _| table == prescriptions::TABLE)
        .times(1)
        .returning(|_, _| Err(MediDashError::Api { status: 500, message: "insert failed".to_string() }));

    let service = PrescriptionService::new(std::sync::Arc::new(backend), MetricsCollector::new());
    let err = service.issue(&doctor, &form(Uuid::new_v4()), today()).await.unwrap_err();

    match err {
        MediDashError::IncompletePrescription { medical_record_id, source } => {
            assert_eq!(medical_record_id, record_id);
            assert_eq!(source.to_string(), "insert failed");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_listings_respect_patient_access() {
    let clinic = Clinic::new();
    let service = clinic.service();
    service.prescriptions().issue(&clinic.doctor, &form(clinic.patient_id), today()).await.unwrap();

    let own = service.prescriptions().for_patient(&clinic.patient, clinic.patient_id).await.unwrap();
    assert_eq!(own.len(), 1);

    let stranger = user(Some(Role::Patient), "eve@example.com");
    let err = service.prescriptions().for_patient(&stranger, clinic.patient_id).await.unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));

    let recent = service.prescriptions().recent_for_doctor(&clinic.doctor, 10).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn test_active_prescriptions_drop_expired() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let mut short = form(clinic.patient_id);
    short.valid_until = Some(today());
    service.prescriptions().issue(&clinic.doctor, &short, today()).await.unwrap();
    service.prescriptions().issue(&clinic.doctor, &form(clinic.patient_id), today()).await.unwrap();

    let later = today().succ_opt().unwrap();
    let active = service.prescriptions().active_for_patient(&clinic.doctor, clinic.patient_id, later).await.unwrap();

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].valid_until, None);
}

#[tokio::test]
async fn test_doctor_active_list_skips_expired() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let mut short = form(clinic.patient_id);
    short.valid_until = Some(today());
    service.prescriptions().issue(&clinic.doctor, &short, today()).await.unwrap();
    let mut long = form(clinic.patient_id);
    long.valid_until = today().checked_add_days(chrono::Days::new(30));
    service.prescriptions().issue(&clinic.doctor, &long, today()).await.unwrap();
    service.prescriptions().issue(&clinic.doctor, &form(clinic.patient_id), today()).await.unwrap();

    let later = today().succ_opt().unwrap();
    let active = service.prescriptions().active_for_doctor(&clinic.doctor, 20, later).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|p| !matches!(p.valid_until, Some(until) if until < later)));

    assert_eq!(service.prescriptions().recent_for_doctor(&clinic.doctor, 20).await.unwrap().len(), 3);
}
