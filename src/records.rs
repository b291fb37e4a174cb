//! Patients, medical records, documents and role assignment

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{MediDashError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{
    Doctor, Document, DocumentDecision, MedicalRecord, NewDocument, NewPatient, NewUserRole, Patient, Role, UserRole,
    VerificationStatus,
};
use crate::query::QueryBuilder;
use crate::repository::{fetch_all, fetch_optional, insert_one, update_where, DataClient};
use crate::router::{can, require, Capability};
use crate::schema::{doctors, documents, medical_records, patients, profiles, user_roles};
use crate::validation::InputValidator;

/// Patient row linked to an auth user
pub async fn patient_for_user(client: &dyn DataClient, user_id: Uuid) -> Result<Option<Patient>> {
    let query = QueryBuilder::new().eq(patients::USER_ID, user_id);
    fetch_optional(client, patients::TABLE, &query).await
}

/// Doctor row linked to an auth user
pub async fn doctor_for_user(client: &dyn DataClient, user_id: Uuid) -> Result<Option<Doctor>> {
    let query = QueryBuilder::new().eq(doctors::USER_ID, user_id);
    fetch_optional(client, doctors::TABLE, &query).await
}

/// Staff who may view patients pass; patients only for their own record
pub async fn check_patient_access(client: &dyn DataClient, user: &CurrentUser, patient_id: Uuid) -> Result<()> {
    if can(user, Capability::ViewPatients) {
        return Ok(());
    }
    require(user, Capability::ViewOwnRecords)?;
    match patient_for_user(client, user.id).await? {
        Some(own) if own.id == patient_id => Ok(()),
        _ => Err(MediDashError::Forbidden("Patients can only view their own records".to_string())),
    }
}

/// `full_name` of each id found in `table`
pub async fn names_by_id(
    client: &dyn DataClient, table: &str, ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = QueryBuilder::new().select(&["id", "full_name"]).in_list("id", ids);
    let rows = client.select(table, &query).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let id = row.get("id")?.as_str()?.parse().ok()?;
            let name = row.get("full_name")?.as_str()?.to_string();
            Some((id, name))
        })
        .collect())
}

/// Registration form filled in at the front desk
#[derive(Debug, Clone, Default)]
pub struct PatientRegistration {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

/// Metadata of an uploaded file
#[derive(Debug, Clone, Default)]
pub struct DocumentUpload {
    /// Defaults to the uploader's own patient record
    pub patient_id: Option<Uuid>,
    pub document_type: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub file_url: String,
    pub notes: Option<String>,
}

/// Staff member with their role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub user_id: Uuid,
    pub role: Role,
    pub full_name: Option<String>,
}

pub struct RecordsService {
    client: Arc<dyn DataClient>,
    metrics: MetricsCollector,
}

impl RecordsService {
    pub fn new(client: Arc<dyn DataClient>, metrics: MetricsCollector) -> Self {
        Self { client, metrics }
    }

    fn client(&self) -> &dyn DataClient {
        self.client.as_ref()
    }

    pub async fn patient_for_user(&self, user: &CurrentUser) -> Result<Option<Patient>> {
        patient_for_user(self.client(), user.id).await
    }

    fn validate_registration(form: &PatientRegistration, today: NaiveDate) -> Result<NaiveDate> {
        let date_of_birth = form.date_of_birth.map(|d| d.to_string()).unwrap_or_default();
        InputValidator::validate_required(&[
            ("full_name", form.full_name.as_str()),
            ("phone", form.phone.as_str()),
            ("date_of_birth", date_of_birth.as_str()),
            ("gender", form.gender.as_str()),
        ])?;
        let date_of_birth = form
            .date_of_birth
            .ok_or_else(|| MediDashError::validation("Date of birth is required"))?;

        InputValidator::validate_person_name(&form.full_name)?;
        InputValidator::validate_phone(&form.phone)?;
        InputValidator::validate_gender(&form.gender)?;
        InputValidator::validate_date_of_birth(date_of_birth, today)?;
        if let Some(email) = form.email.as_deref().filter(|e| !e.trim().is_empty()) {
            InputValidator::validate_email(email)?;
        }
        if let Some(group) = form.blood_group.as_deref().filter(|g| !g.trim().is_empty()) {
            InputValidator::validate_blood_group(group)?;
        }
        if let Some(phone) = form.emergency_contact_phone.as_deref().filter(|p| !p.trim().is_empty()) {
            InputValidator::validate_phone(phone)?;
        }
        Ok(date_of_birth)
    }

    /// Front-desk registration of a walk-in patient
    pub async fn register_patient(
        &self, staff: &CurrentUser, form: &PatientRegistration, today: NaiveDate,
    ) -> Result<Patient> {
        require(staff, Capability::RegisterPatients)?;

        let date_of_birth = match Self::validate_registration(form, today) {
            Ok(date) => date,
            Err(e) => {
                self.metrics.record_form_rejection("patient_registration");
                return Err(e);
            },
        };

        let new_patient = NewPatient {
            user_id: None,
            full_name: InputValidator::sanitize_text(&form.full_name),
            email: InputValidator::optional_text(form.email.as_deref()),
            phone: form.phone.trim().to_string(),
            date_of_birth,
            gender: form.gender.trim().to_lowercase(),
            blood_group: InputValidator::optional_text(form.blood_group.as_deref()),
            address: InputValidator::optional_text(form.address.as_deref()),
            allergies: InputValidator::optional_text(form.allergies.as_deref()),
            emergency_contact_name: InputValidator::optional_text(form.emergency_contact_name.as_deref()),
            emergency_contact_phone: InputValidator::optional_text(form.emergency_contact_phone.as_deref()),
        };

        let patient: Patient = insert_one(self.client(), patients::TABLE, &new_patient).await?;
        info!(patient_id = %patient.id, registered_by = %staff.id, "Patient registered");
        Ok(patient)
    }

    /// Patients whose name contains `term`, ignoring case
    pub async fn search_patients(&self, user: &CurrentUser, term: &str) -> Result<Vec<Patient>> {
        require(user, Capability::ViewPatients)?;

        let term = InputValidator::sanitize_text(term).replace(['*', '%'], "");
        let mut query = QueryBuilder::new().order_asc(patients::FULL_NAME);
        if !term.is_empty() {
            query = query.ilike(patients::FULL_NAME, &format!("*{term}*"));
        }
        fetch_all(self.client(), patients::TABLE, &query).await
    }

    /// Records of a patient, newest first
    pub async fn medical_records(&self, user: &CurrentUser, patient_id: Uuid) -> Result<Vec<MedicalRecord>> {
        check_patient_access(self.client(), user, patient_id).await?;
        let query = QueryBuilder::new()
            .eq(medical_records::PATIENT_ID, patient_id)
            .order_desc(medical_records::RECORD_DATE);
        fetch_all(self.client(), medical_records::TABLE, &query).await
    }

    pub async fn upload_document(&self, user: &CurrentUser, upload: &DocumentUpload) -> Result<Document> {
        let patient_id = match upload.patient_id {
            Some(id) => {
                check_patient_access(self.client(), user, id).await?;
                id
            },
            None => self
                .patient_for_user(user)
                .await?
                .map(|p| p.id)
                .ok_or_else(|| MediDashError::NotFound("No patient record for the current user".to_string()))?,
        };

        if let Err(e) = InputValidator::validate_required(&[
            ("document_type", upload.document_type.as_str()),
            ("file_name", upload.file_name.as_str()),
            ("file_url", upload.file_url.as_str()),
        ]) {
            self.metrics.record_form_rejection("document_upload");
            return Err(e);
        }

        let new_document = NewDocument {
            patient_id,
            document_type: InputValidator::sanitize_text(&upload.document_type),
            file_name: InputValidator::sanitize_text(&upload.file_name),
            file_size: upload.file_size,
            file_url: upload.file_url.trim().to_string(),
            notes: InputValidator::optional_text(upload.notes.as_deref()),
            uploaded_by: user.id,
            verification_status: VerificationStatus::Pending,
        };
        let document: Document = insert_one(self.client(), documents::TABLE, &new_document).await?;
        info!(document_id = %document.id, patient_id = %patient_id, "Document uploaded");
        Ok(document)
    }

    pub async fn documents_for_patient(&self, user: &CurrentUser, patient_id: Uuid) -> Result<Vec<Document>> {
        check_patient_access(self.client(), user, patient_id).await?;
        let query = QueryBuilder::new()
            .eq(documents::PATIENT_ID, patient_id)
            .order_desc(documents::CREATED_AT);
        fetch_all(self.client(), documents::TABLE, &query).await
    }

    /// Documents awaiting review, oldest first
    pub async fn pending_documents(&self, user: &CurrentUser) -> Result<Vec<Document>> {
        require(user, Capability::VerifyDocuments)?;
        let query = QueryBuilder::new()
            .eq(documents::VERIFICATION_STATUS, VerificationStatus::Pending)
            .order_asc(documents::CREATED_AT);
        fetch_all(self.client(), documents::TABLE, &query).await
    }

    /// Record a review decision on a pending document
    pub async fn verify_document(
        &self, staff: &CurrentUser, document_id: Uuid, decision: VerificationStatus, notes: Option<&str>,
    ) -> Result<Document> {
        require(staff, Capability::VerifyDocuments)?;
        if decision == VerificationStatus::Pending {
            return Err(MediDashError::validation("Decision must be verified or rejected"));
        }

        let query = QueryBuilder::new()
            .eq(documents::ID, document_id)
            .eq(documents::VERIFICATION_STATUS, VerificationStatus::Pending);
        let changes = DocumentDecision {
            verification_status: decision,
            verified_by: staff.id,
            verified_at: Utc::now(),
            notes: InputValidator::optional_text(notes),
        };

        let mut updated: Vec<Document> = update_where(self.client(), documents::TABLE, &query, &changes).await?;
        if let Some(document) = updated.pop() {
            info!(document_id = %document_id, decision = decision.as_str(), "Document reviewed");
            return Ok(document);
        }

        let lookup = QueryBuilder::new().eq(documents::ID, document_id);
        match fetch_optional::<Document>(self.client(), documents::TABLE, &lookup).await? {
            Some(existing) => Err(MediDashError::validation(format!(
                "Document has already been {}",
                existing.verification_status.as_str()
            ))),
            None => Err(MediDashError::NotFound(format!("Document {document_id}"))),
        }
    }

    /// Everyone holding a role other than patient
    pub async fn staff_members(&self, user: &CurrentUser) -> Result<Vec<StaffMember>> {
        require(user, Capability::ManageUsers)?;

        let query = QueryBuilder::new().neq(user_roles::ROLE, Role::Patient);
        let rows = self.client().select(user_roles::TABLE, &query).await?;

        let mut staff = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_id = row.get(user_roles::USER_ID).and_then(Value::as_str).and_then(|id| id.parse().ok());
            let role = row.get(user_roles::ROLE).and_then(Value::as_str).and_then(Role::parse_lenient);
            match (user_id, role) {
                (Some(user_id), Some(role)) => staff.push(StaffMember { user_id, role, full_name: None }),
                _ => warn!(row = %row, "Skipping malformed role row"),
            }
        }

        let names = names_by_id(self.client(), profiles::TABLE, staff.iter().map(|s| s.user_id)).await?;
        for member in &mut staff {
            member.full_name = names.get(&member.user_id).cloned();
        }
        staff.sort_by(|a, b| (a.role.as_str(), &a.full_name).cmp(&(b.role.as_str(), &b.full_name)));
        Ok(staff)
    }

    /// Give `user_id` exactly one role
    pub async fn assign_role(&self, admin: &CurrentUser, user_id: Uuid, role: Role) -> Result<UserRole> {
        require(admin, Capability::AssignRoles)?;

        let query = QueryBuilder::new().eq(user_roles::USER_ID, user_id);
        let mut updated: Vec<UserRole> =
            update_where(self.client(), user_roles::TABLE, &query, &serde_json::json!({ "role": role })).await?;

        let assigned = match updated.len() {
            0 => insert_one(self.client(), user_roles::TABLE, &NewUserRole { user_id, role }).await?,
            1 => updated.remove(0),
            n => {
                return Err(MediDashError::UnexpectedResponse {
                    table: user_roles::TABLE.to_string(),
                    detail: format!("user {user_id} has {n} role rows"),
                })
            },
        };
        info!(user_id = %user_id, role = %role, assigned_by = %admin.id, "Role assigned");
        Ok(assigned)
    }
}
