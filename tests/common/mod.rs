//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use medidash::auth::CurrentUser;
use medidash::booking::TimeSlots;
use medidash::fallback::LocalStore;
use medidash::memory::MemoryClient;
use medidash::metrics::MetricsCollector;
use medidash::models::Role;
use medidash::schema::{doctors, patients, user_roles};
use medidash::service::HospitalService;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
}

pub fn user(role: Option<Role>, email: &str) -> CurrentUser {
    CurrentUser { id: Uuid::new_v4(), email: Some(email.to_string()), role }
}

pub fn doctor_row(id: Uuid, user_id: Uuid, name: &str, specialization: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "full_name": name,
        "email": format!("{}@clinic.org", name.to_lowercase().replace([' ', '.'], "")),
        "phone": "555-0100",
        "specialization": specialization,
        "qualification": "MD",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z",
    })
}

pub fn patient_row(id: Uuid, user_id: Option<Uuid>, name: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "full_name": name,
        "phone": "555-0199",
        "date_of_birth": "1990-05-17",
        "gender": "female",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z",
    })
}

pub fn role_row(user_id: Uuid, role: Role) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "user_id": user_id,
        "role": role,
        "created_at": "2025-01-01T00:00:00Z",
    })
}

pub fn appointment_row(patient_id: Uuid, doctor_id: Uuid, date: &str, time: &str, status: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "appointment_date": date,
        "appointment_time": time,
        "reason": "Checkup",
        "status": status,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z",
    })
}

/// A small hospital: one doctor, one patient with an account, roles for both
pub struct Clinic {
    pub client: Arc<MemoryClient>,
    pub doctor: CurrentUser,
    pub doctor_id: Uuid,
    pub patient: CurrentUser,
    pub patient_id: Uuid,
}

impl Clinic {
    pub fn new() -> Self {
        let client = Arc::new(MemoryClient::new());
        let doctor = user(Some(Role::Doctor), "house@clinic.org");
        let patient = user(Some(Role::Patient), "ada@example.com");
        let doctor_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        client
            .seed(doctors::TABLE, [doctor_row(doctor_id, doctor.id, "Dr. Gregory House", "Diagnostics")])
            .unwrap();
        client
            .seed(patients::TABLE, [patient_row(patient_id, Some(patient.id), "Ada Lovelace")])
            .unwrap();
        client
            .seed(user_roles::TABLE, [role_row(doctor.id, Role::Doctor), role_row(patient.id, Role::Patient)])
            .unwrap();

        Self { client, doctor, doctor_id, patient, patient_id }
    }

    pub fn service(&self) -> HospitalService {
        HospitalService::new(self.client.clone(), None, TimeSlots::default(), MetricsCollector::new())
    }

    pub fn service_with_store(&self, store: Arc<LocalStore>) -> HospitalService {
        HospitalService::new(self.client.clone(), Some(store), TimeSlots::default(), MetricsCollector::new())
    }
}
