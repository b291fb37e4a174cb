//! Data models for the hospital backend
//!
//! Row types mirror the tables owned by the hosted service. `New*` types are
//! insert payloads and omit the columns the service fills in.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MediDashError;

/// Access level of a user. Exactly one per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Complete system control and user management
    SuperAdmin,
    /// Hospital operations and staff oversight
    Admin,
    /// Patient care and prescription management
    Doctor,
    /// Appointments and own medical records
    Patient,
    /// Patient care tracking and medication logs
    Nurse,
    /// Appointment scheduling and check-ins
    Receptionist,
}

impl Role {
    /// Every role, in display order
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Doctor,
        Role::Patient,
        Role::Nurse,
        Role::Receptionist,
    ];

    /// Value stored in the `user_roles.role` column
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Patient => "patient",
            Self::Nurse => "nurse",
            Self::Receptionist => "receptionist",
        }
    }

    /// Human readable role name shown in the header badge
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::Admin => "Admin",
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
            Self::Nurse => "Nurse",
            Self::Receptionist => "Receptionist",
        }
    }

    /// Parse a stored role value, returning `None` for anything unknown
    #[must_use]
    pub fn parse_lenient(value: &str) -> Option<Self> {
        value.parse().ok()
    }

    /// True for roles that count as hospital staff
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Patient)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MediDashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "doctor" => Ok(Self::Doctor),
            "patient" => Ok(Self::Patient),
            "nurse" => Ok(Self::Nurse),
            "receptionist" => Ok(Self::Receptionist),
            other => Err(MediDashError::validation(format!("Unknown role: {other}"))),
        }
    }
}

/// Lifecycle label on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Requested, not yet placed on the schedule
    Pending,
    /// Placed on the doctor's schedule
    Scheduled,
    /// Confirmed or checked in
    Confirmed,
    /// Visit took place
    Completed,
    /// Called off by either side
    Cancelled,
    /// Patient did not attend
    NoShow,
}

impl AppointmentStatus {
    /// Every status value
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Value stored in the `appointments.status` column
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Label used in listings
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No Show",
        }
    }

    /// Statuses after which the booking is closed
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Statuses that still occupy a slot on the calendar
    #[must_use]
    pub const fn is_upcoming(&self) -> bool {
        matches!(self, Self::Pending | Self::Scheduled | Self::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = MediDashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Self::Pending),
            "scheduled" => Ok(Self::Scheduled),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "no_show" => Ok(Self::NoShow),
            other => Err(MediDashError::validation(format!("Unknown appointment status: {other}"))),
        }
    }
}

/// Review state of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Awaiting review
    Pending,
    /// Accepted by staff
    Verified,
    /// Refused by staff
    Rejected,
}

impl VerificationStatus {
    /// Value stored in the `documents.verification_status` column
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = MediDashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(MediDashError::validation(format!("Unknown verification status: {other}"))),
        }
    }
}

/// Identity record with display name and contact info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Same identifier as the auth user
    pub id: Uuid,
    /// Display name
    pub full_name: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Avatar image location
    pub avatar_url: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Row of the `user_roles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    /// Primary key
    pub id: Uuid,
    /// Auth user the role belongs to
    pub user_id: Uuid,
    /// Assigned role
    pub role: Role,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `user_roles`
#[derive(Debug, Clone, Serialize)]
pub struct NewUserRole {
    /// Auth user the role belongs to
    pub user_id: Uuid,
    /// Assigned role
    pub role: Role,
}

/// Doctor profile extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    /// Primary key
    pub id: Uuid,
    /// Auth user of the doctor
    pub user_id: Uuid,
    /// Display name
    pub full_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Medical specialization
    pub specialization: String,
    /// Degrees and certifications
    pub qualification: String,
    /// Years in practice
    pub experience_years: Option<i32>,
    /// Fee per consultation
    pub consultation_fee: Option<f64>,
    /// Weekdays the doctor sees patients
    pub available_days: Option<Vec<String>>,
    /// Free-text consultation hours
    pub available_hours: Option<String>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// The three doctor columns the booking form needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    /// Primary key
    pub id: Uuid,
    /// Display name
    pub full_name: String,
    /// Medical specialization
    pub specialization: String,
}

impl DoctorSummary {
    /// Option label in the doctor picker
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.full_name, self.specialization)
    }
}

/// Patient profile extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Primary key
    pub id: Uuid,
    /// Auth user, absent for walk-in registrations
    pub user_id: Option<Uuid>,
    /// Display name
    pub full_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Gender as recorded at registration
    pub gender: String,
    /// ABO/Rh blood group
    pub blood_group: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Known allergies
    pub allergies: Option<String>,
    /// Medical history notes
    pub medical_history: Option<String>,
    /// Medications currently taken
    pub current_medications: Option<String>,
    /// Emergency contact name
    pub emergency_contact_name: Option<String>,
    /// Emergency contact phone
    pub emergency_contact_phone: Option<String>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `patients`
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPatient {
    /// Auth user, absent for walk-in registrations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// Display name
    pub full_name: String,
    /// Contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone
    pub phone: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Gender
    pub gender: String,
    /// ABO/Rh blood group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Known allergies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    /// Emergency contact name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    /// Emergency contact phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<String>,
}

/// Row of the `appointments` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Primary key
    pub id: Uuid,
    /// Patient being seen
    pub patient_id: Uuid,
    /// Doctor seeing the patient
    pub doctor_id: Uuid,
    /// Day of the visit
    pub appointment_date: NaiveDate,
    /// Start time of the visit
    pub appointment_time: NaiveTime,
    /// Free-text reason for the visit
    pub reason: Option<String>,
    /// Staff notes
    pub notes: Option<String>,
    /// Lifecycle status
    pub status: AppointmentStatus,
    /// User who created the booking
    pub created_by: Option<Uuid>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `appointments`
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    /// Patient being seen
    pub patient_id: Uuid,
    /// Doctor seeing the patient
    pub doctor_id: Uuid,
    /// Day of the visit
    pub appointment_date: NaiveDate,
    /// Start time of the visit
    pub appointment_time: NaiveTime,
    /// Free-text reason for the visit
    pub reason: Option<String>,
    /// Initial status
    pub status: AppointmentStatus,
    /// User who created the booking
    pub created_by: Option<Uuid>,
}

/// Partial update for `appointments`
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentUpdate {
    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    /// New staff notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Row of the `medical_records` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    /// Primary key
    pub id: Uuid,
    /// Patient the record belongs to
    pub patient_id: Uuid,
    /// Doctor who wrote the record
    pub doctor_id: Uuid,
    /// Visit the record came out of
    pub appointment_id: Option<Uuid>,
    /// Diagnosis text
    pub diagnosis: String,
    /// Reported symptoms
    pub symptoms: Option<String>,
    /// Treatment plan
    pub treatment: Option<String>,
    /// Additional notes
    pub notes: Option<String>,
    /// Day the record was written
    pub record_date: NaiveDate,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `medical_records`
#[derive(Debug, Clone, Serialize)]
pub struct NewMedicalRecord {
    /// Patient the record belongs to
    pub patient_id: Uuid,
    /// Doctor who wrote the record
    pub doctor_id: Uuid,
    /// Visit the record came out of
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<Uuid>,
    /// Diagnosis text
    pub diagnosis: String,
    /// Reported symptoms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    /// Treatment plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    /// Day the record was written
    pub record_date: NaiveDate,
}

/// One entry of a prescription's medication list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Drug name
    pub name: String,
    /// Amount per dose, e.g. "500mg"
    pub dosage: String,
    /// How often, e.g. "twice daily"
    pub frequency: String,
    /// How long, e.g. "7 days"
    pub duration: String,
}

impl Medication {
    /// True when every field is blank
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [&self.name, &self.dosage, &self.frequency, &self.duration]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Row of the `prescriptions` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    /// Primary key
    pub id: Uuid,
    /// Patient receiving the medication
    pub patient_id: Uuid,
    /// Prescribing doctor
    pub doctor_id: Uuid,
    /// Medical record this prescription belongs to
    pub medical_record_id: Option<Uuid>,
    /// Structured medication list
    pub medications: Vec<Medication>,
    /// Instructions to the patient
    pub instructions: Option<String>,
    /// Day the prescription was issued
    pub prescription_date: NaiveDate,
    /// Last day the prescription may be filled
    pub valid_until: Option<NaiveDate>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `prescriptions`
#[derive(Debug, Clone, Serialize)]
pub struct NewPrescription {
    /// Patient receiving the medication
    pub patient_id: Uuid,
    /// Prescribing doctor
    pub doctor_id: Uuid,
    /// Medical record this prescription belongs to
    pub medical_record_id: Option<Uuid>,
    /// Structured medication list
    pub medications: Vec<Medication>,
    /// Instructions to the patient
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Day the prescription was issued
    pub prescription_date: NaiveDate,
    /// Last day the prescription may be filled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
}

/// Row of the `documents` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Primary key
    pub id: Uuid,
    /// Patient the document belongs to
    pub patient_id: Uuid,
    /// Kind of document, e.g. "lab_report"
    pub document_type: String,
    /// Original file name
    pub file_name: String,
    /// Size in bytes
    pub file_size: Option<i64>,
    /// Storage location
    pub file_url: String,
    /// Uploader or reviewer notes
    pub notes: Option<String>,
    /// User who uploaded the file
    pub uploaded_by: Uuid,
    /// Review state
    pub verification_status: VerificationStatus,
    /// When the review decision was made
    pub verified_at: Option<DateTime<Utc>>,
    /// Staff member who decided
    pub verified_by: Option<Uuid>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for `documents`
#[derive(Debug, Clone, Serialize)]
pub struct NewDocument {
    /// Patient the document belongs to
    pub patient_id: Uuid,
    /// Kind of document
    pub document_type: String,
    /// Original file name
    pub file_name: String,
    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    /// Storage location
    pub file_url: String,
    /// Uploader notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// User who uploaded the file
    pub uploaded_by: Uuid,
    /// Initial review state
    pub verification_status: VerificationStatus,
}

/// Review decision written to `documents`
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDecision {
    /// Verified or rejected
    pub verification_status: VerificationStatus,
    /// Staff member who decided
    pub verified_by: Uuid,
    /// Decision time
    pub verified_at: DateTime<Utc>,
    /// Reviewer notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Output format for exported reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = MediDashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(MediDashError::validation(format!("Unknown output format: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_column_value() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(Role::parse_lenient("janitor"), None);
        assert_eq!(Role::parse_lenient("super-admin"), Some(Role::SuperAdmin));
    }

    #[test]
    fn test_appointment_deserializes_from_row() {
        let row = serde_json::json!({
            "id": "7d0f4c1a-3b8e-4a57-9a3b-0c2a3b1f9e11",
            "patient_id": "11111111-1111-4111-8111-111111111111",
            "doctor_id": "22222222-2222-4222-8222-222222222222",
            "appointment_date": "2025-03-04",
            "appointment_time": "09:30:00",
            "reason": "Follow-up",
            "notes": null,
            "status": "no_show",
            "created_by": null,
            "created_at": "2025-03-01T08:00:00.123456+00:00",
            "updated_at": "2025-03-01T08:00:00+00:00"
        });
        let appointment: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appointment.status, AppointmentStatus::NoShow);
        assert_eq!(appointment.appointment_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let parsed: Result<AppointmentStatus, _> = serde_json::from_value(serde_json::json!("archived"));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
    }
}
