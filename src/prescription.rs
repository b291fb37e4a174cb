//! Prescription workflow
//!
//! Issuing a prescription writes two rows: a medical record describing the
//! visit, then the prescription that references it. The two inserts are not
//! atomic. When the second one fails the record stays and the error carries
//! its id.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{MediDashError, Result};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{MedicalRecord, Medication, NewMedicalRecord, NewPrescription, Prescription};
use crate::query::QueryBuilder;
use crate::records::{check_patient_access, doctor_for_user};
use crate::repository::{fetch_all, insert_one, DataClient};
use crate::router::{require, Capability};
use crate::schema::{medical_records, prescriptions};
use crate::validation::{InputValidator, REQUIRED_FIELDS_MESSAGE};

/// Values entered in the prescription dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionForm {
    pub patient_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub diagnosis: String,
    pub symptoms: String,
    pub treatment: String,
    pub instructions: String,
    pub valid_until: Option<NaiveDate>,
    pub medications: Vec<Medication>,
}

impl Default for PrescriptionForm {
    fn default() -> Self {
        Self {
            patient_id: None,
            appointment_id: None,
            diagnosis: String::new(),
            symptoms: String::new(),
            treatment: String::new(),
            instructions: String::new(),
            valid_until: None,
            medications: vec![Medication::default()],
        }
    }
}

impl PrescriptionForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty medication row
    pub fn add_medication(&mut self) -> &mut Medication {
        self.medications.push(Medication::default());
        let last = self.medications.len() - 1;
        &mut self.medications[last]
    }

    /// Remove a row; the last remaining row stays
    pub fn remove_medication(&mut self, index: usize) -> bool {
        if self.medications.len() <= 1 || index >= self.medications.len() {
            return false;
        }
        self.medications.remove(index);
        true
    }

    pub fn medication_mut(&mut self, index: usize) -> Option<&mut Medication> {
        self.medications.get_mut(index)
    }

    /// Non-blank medication rows, checked for completeness
    fn validate(&self, today: NaiveDate) -> Result<(Uuid, Vec<Medication>)> {
        let Some(patient_id) = self.patient_id else {
            return Err(MediDashError::validation(REQUIRED_FIELDS_MESSAGE));
        };
        if self.diagnosis.trim().is_empty() {
            return Err(MediDashError::validation(REQUIRED_FIELDS_MESSAGE));
        }

        let kept: Vec<Medication> = self
            .medications
            .iter()
            .filter(|m| !m.is_blank())
            .map(|m| Medication {
                name: InputValidator::sanitize_text(&m.name),
                dosage: InputValidator::sanitize_text(&m.dosage),
                frequency: InputValidator::sanitize_text(&m.frequency),
                duration: InputValidator::sanitize_text(&m.duration),
            })
            .collect();

        if kept.is_empty() {
            return Err(MediDashError::validation("Add at least one medication"));
        }
        for (position, medication) in kept.iter().enumerate() {
            let complete = [&medication.name, &medication.dosage, &medication.frequency, &medication.duration]
                .iter()
                .all(|field| !field.is_empty());
            if !complete {
                return Err(MediDashError::validation(format!(
                    "Medication {} needs a name, dosage, frequency and duration",
                    position + 1
                )));
            }
        }

        if let Some(valid_until) = self.valid_until {
            InputValidator::validate_not_past(valid_until, today, "Valid until date")?;
        }

        Ok((patient_id, kept))
    }
}

/// Both rows written by [`PrescriptionService::issue`]
#[derive(Debug, Clone)]
pub struct IssuedPrescription {
    pub record: MedicalRecord,
    pub prescription: Prescription,
}

pub struct PrescriptionService {
    client: Arc<dyn DataClient>,
    metrics: MetricsCollector,
}

impl PrescriptionService {
    pub fn new(client: Arc<dyn DataClient>, metrics: MetricsCollector) -> Self {
        Self { client, metrics }
    }

    /// Write a medical record and the prescription that belongs to it
    pub async fn issue(&self, doctor: &CurrentUser, form: &PrescriptionForm, today: NaiveDate) -> Result<IssuedPrescription> {
        require(doctor, Capability::CreatePrescriptions)?;
        let timer = OperationTimer::new("issue_prescription");

        let (patient_id, medications) = match form.validate(today) {
            Ok(valid) => valid,
            Err(e) => {
                self.metrics.record_form_rejection("prescription");
                return Err(e);
            },
        };

        let doctor_row = doctor_for_user(self.client.as_ref(), doctor.id)
            .await?
            .ok_or_else(|| MediDashError::NotFound("No doctor profile for the current user".to_string()))?;

        let new_record = NewMedicalRecord {
            patient_id,
            doctor_id: doctor_row.id,
            appointment_id: form.appointment_id,
            diagnosis: InputValidator::sanitize_text(&form.diagnosis),
            symptoms: InputValidator::optional_text(Some(&form.symptoms)),
            treatment: InputValidator::optional_text(Some(&form.treatment)),
            record_date: today,
        };
        let record: MedicalRecord = insert_one(self.client.as_ref(), medical_records::TABLE, &new_record).await?;

        let new_prescription = NewPrescription {
            patient_id,
            doctor_id: doctor_row.id,
            medical_record_id: Some(record.id),
            medications,
            instructions: InputValidator::optional_text(Some(&form.instructions)),
            prescription_date: today,
            valid_until: form.valid_until,
        };
        let prescription: Prescription =
            match insert_one(self.client.as_ref(), prescriptions::TABLE, &new_prescription).await {
                Ok(prescription) => prescription,
                Err(source) => {
                    warn!(
                        medical_record_id = %record.id,
                        error = %source,
                        "Prescription insert failed after the medical record was saved"
                    );
                    return Err(MediDashError::IncompletePrescription {
                        medical_record_id: record.id,
                        source: Box::new(source),
                    });
                },
            };

        info!(
            prescription_id = %prescription.id,
            medical_record_id = %record.id,
            medications = prescription.medications.len(),
            "Prescription issued"
        );
        timer.finish();
        Ok(IssuedPrescription { record, prescription })
    }

    /// Prescriptions of a patient, newest first
    pub async fn for_patient(&self, user: &CurrentUser, patient_id: Uuid) -> Result<Vec<Prescription>> {
        check_patient_access(self.client.as_ref(), user, patient_id).await?;
        fetch_all(self.client.as_ref(), prescriptions::TABLE, &Self::patient_query(patient_id)).await
    }

    /// Prescriptions of a patient still valid on `today`
    pub async fn active_for_patient(
        &self, user: &CurrentUser, patient_id: Uuid, today: NaiveDate,
    ) -> Result<Vec<Prescription>> {
        check_patient_access(self.client.as_ref(), user, patient_id).await?;
        let query = still_valid(Self::patient_query(patient_id), today);
        fetch_all(self.client.as_ref(), prescriptions::TABLE, &query).await
    }

    /// Latest prescriptions written by the signed-in doctor
    pub async fn recent_for_doctor(&self, doctor: &CurrentUser, limit: usize) -> Result<Vec<Prescription>> {
        self.for_doctor(doctor, limit, None).await
    }

    /// Latest prescriptions written by the signed-in doctor that are still valid on `today`
    pub async fn active_for_doctor(
        &self, doctor: &CurrentUser, limit: usize, today: NaiveDate,
    ) -> Result<Vec<Prescription>> {
        self.for_doctor(doctor, limit, Some(today)).await
    }

    async fn for_doctor(&self, doctor: &CurrentUser, limit: usize, valid_on: Option<NaiveDate>) -> Result<Vec<Prescription>> {
        require(doctor, Capability::CreatePrescriptions)?;
        let Some(doctor_row) = doctor_for_user(self.client.as_ref(), doctor.id).await? else {
            return Ok(Vec::new());
        };
        let mut query = QueryBuilder::new()
            .eq(prescriptions::DOCTOR_ID, doctor_row.id)
            .order_desc(prescriptions::CREATED_AT)
            .limit(limit);
        if let Some(day) = valid_on {
            query = still_valid(query, day);
        }
        fetch_all(self.client.as_ref(), prescriptions::TABLE, &query).await
    }

    fn patient_query(patient_id: Uuid) -> QueryBuilder {
        QueryBuilder::new()
            .eq(prescriptions::PATIENT_ID, patient_id)
            .order_desc(prescriptions::PRESCRIPTION_DATE)
            .order_desc(prescriptions::CREATED_AT)
    }
}

/// Restrict `query` to prescriptions with no expiry or expiring on or after `day`
#[must_use]
pub fn still_valid(query: QueryBuilder, day: NaiveDate) -> QueryBuilder {
    query.any_of(|q| q.is_null(prescriptions::VALID_UNTIL).gte(prescriptions::VALID_UNTIL, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    fn filled(name: &str) -> Medication {
        Medication {
            name: name.to_string(),
            dosage: "500mg".to_string(),
            frequency: "twice daily".to_string(),
            duration: "7 days".to_string(),
        }
    }

    #[test]
    fn test_form_starts_with_one_row() {
        let mut form = PrescriptionForm::new();
        assert_eq!(form.medications.len(), 1);
        assert!(!form.remove_medication(0));
        form.add_medication().name = "Ibuprofen".to_string();
        assert!(form.remove_medication(0));
        assert_eq!(form.medications[0].name, "Ibuprofen");
    }

    #[test]
    fn test_blank_rows_are_ignored() {
        let mut form = PrescriptionForm { patient_id: Some(Uuid::new_v4()), diagnosis: "Flu".into(), ..PrescriptionForm::new() };
        *form.add_medication() = filled("Paracetamol");
        form.add_medication();
        let (_, kept) = form.validate(today()).unwrap();
        assert_eq!(kept, vec![filled("Paracetamol")]);
    }

    #[test]
    fn test_incomplete_row_is_rejected() {
        let mut form = PrescriptionForm { patient_id: Some(Uuid::new_v4()), diagnosis: "Flu".into(), ..PrescriptionForm::new() };
        if let Some(row) = form.medication_mut(0) {
            row.name = "Amoxicillin".to_string();
        }
        let err = form.validate(today()).unwrap_err();
        assert!(err.to_string().starts_with("Medication 1"));
    }

    #[test]
    fn test_missing_diagnosis() {
        let mut form = PrescriptionForm { patient_id: Some(Uuid::new_v4()), ..PrescriptionForm::new() };
        form.medications[0] = filled("Paracetamol");
        assert_eq!(form.validate(today()).unwrap_err().to_string(), REQUIRED_FIELDS_MESSAGE);
    }
}
