//! Integration tests for patients, documents and role assignment

mod common;

use chrono::NaiveDate;
use common::{role_row, today, user, Clinic};
use uuid::Uuid;

use medidash::error::MediDashError;
use medidash::models::{Role, VerificationStatus};
use medidash::records::{DocumentUpload, PatientRegistration};
use medidash::schema::{profiles, user_roles};

fn registration() -> PatientRegistration {
    PatientRegistration {
        full_name: "Alan Turing".to_string(),
        phone: "+44 20 7946 0958".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1954, 6, 7),
        gender: "Male".to_string(),
        blood_group: Some("O-".to_string()),
        ..PatientRegistration::default()
    }
}

fn upload(patient_id: Option<Uuid>) -> DocumentUpload {
    DocumentUpload {
        patient_id,
        document_type: "lab_report".to_string(),
        file_name: "blood-panel.pdf".to_string(),
        file_size: Some(48_213),
        file_url: "https://files.example.com/blood-panel.pdf".to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn test_receptionist_registers_patient() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let receptionist = user(Some(Role::Receptionist), "front@clinic.org");

    let patient = service.records().register_patient(&receptionist, &registration(), today()).await.unwrap();

    assert_eq!(patient.full_name, "Alan Turing");
    assert_eq!(patient.gender, "male");
    assert_eq!(patient.user_id, None);
    assert_eq!(patient.blood_group.as_deref(), Some("O-"));
}

#[tokio::test]
async fn test_registration_validation() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let receptionist = user(Some(Role::Receptionist), "front@clinic.org");

    let bad_group = PatientRegistration { blood_group: Some("C+".to_string()), ..registration() };
    assert!(service.records().register_patient(&receptionist, &bad_group, today()).await.unwrap_err().is_validation());

    let unborn = PatientRegistration { date_of_birth: today().succ_opt(), ..registration() };
    assert!(service.records().register_patient(&receptionist, &unborn, today()).await.unwrap_err().is_validation());

    let err = service.records().register_patient(&clinic.doctor, &registration(), today()).await.unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));
    assert_eq!(service.metrics().snapshot().form_rejections, 2);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let clinic = Clinic::new();
    let service = clinic.service();

    let found = service.records().search_patients(&clinic.doctor, "LOVE").await.unwrap();
    assert_eq!(found.len(), 1);
    assert!(service.records().search_patients(&clinic.doctor, "turing").await.unwrap().is_empty());

    let err = service.records().search_patients(&clinic.patient, "ada").await.unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));
}

#[tokio::test]
async fn test_document_upload_and_review() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let admin = user(Some(Role::Admin), "boss@clinic.org");

    let document = service.records().upload_document(&clinic.patient, &upload(None)).await.unwrap();
    assert_eq!(document.patient_id, clinic.patient_id);
    assert_eq!(document.verification_status, VerificationStatus::Pending);
    assert_eq!(service.records().pending_documents(&admin).await.unwrap().len(), 1);

    let reviewed = service
        .records()
        .verify_document(&admin, document.id, VerificationStatus::Verified, Some("Looks right"))
        .await
        .unwrap();
    assert_eq!(reviewed.verification_status, VerificationStatus::Verified);
    assert_eq!(reviewed.verified_by, Some(admin.id));
    assert!(service.records().pending_documents(&admin).await.unwrap().is_empty());

    let err = service
        .records()
        .verify_document(&admin, document.id, VerificationStatus::Rejected, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Document has already been verified");
}

#[tokio::test]
async fn test_patient_cannot_upload_for_someone_else() {
    let clinic = Clinic::new();
    let service = clinic.service();

    let err = service.records().upload_document(&clinic.patient, &upload(Some(Uuid::new_v4()))).await.unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));

    let incomplete = DocumentUpload { file_url: "  ".to_string(), ..upload(None) };
    assert!(service.records().upload_document(&clinic.patient, &incomplete).await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_assign_role_keeps_one_row_per_user() {
    let clinic = Clinic::new();
    let service = clinic.service();
    let super_admin = user(Some(Role::SuperAdmin), "root@clinic.org");
    let newcomer = Uuid::new_v4();

    let first = service.records().assign_role(&super_admin, newcomer, Role::Nurse).await.unwrap();
    assert_eq!(first.role, Role::Nurse);
    let second = service.records().assign_role(&super_admin, newcomer, Role::Receptionist).await.unwrap();
    assert_eq!(second.id, first.id);

    let rows = clinic.client.rows(user_roles::TABLE).unwrap();
    let newcomer_rows = rows.iter().filter(|row| row["user_id"] == serde_json::json!(newcomer)).count();
    assert_eq!(newcomer_rows, 1);

    let admin = user(Some(Role::Admin), "boss@clinic.org");
    let err = service.records().assign_role(&admin, newcomer, Role::Doctor).await.unwrap_err();
    assert!(matches!(err, MediDashError::Forbidden(_)));
}

#[tokio::test]
async fn test_staff_members_resolve_profile_names() {
    let clinic = Clinic::new();
    let nurse = Uuid::new_v4();
    clinic.client.seed(user_roles::TABLE, [role_row(nurse, Role::Nurse)]).unwrap();
    clinic
        .client
        .seed(
            profiles::TABLE,
            [serde_json::json!({ "id": nurse, "full_name": "Florence Nightingale" })],
        )
        .unwrap();
    let admin = user(Some(Role::Admin), "boss@clinic.org");

    let staff = clinic.service().records().staff_members(&admin).await.unwrap();

    assert_eq!(staff.len(), 2);
    let florence = staff.iter().find(|s| s.user_id == nurse).unwrap();
    assert_eq!(florence.full_name.as_deref(), Some("Florence Nightingale"));
    assert!(staff.iter().all(|s| s.role != Role::Patient));
}
