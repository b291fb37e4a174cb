//! User-facing notifications
//!
//! Every outcome a user sees, success or failure, is rendered as a
//! [`Notification`]: a short title plus a one-line description.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use crate::error::MediDashError;
use crate::models::{Role, VerificationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Success, title: title.into(), description: description.into() }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Destructive, title: title.into(), description: description.into() }
    }

    /// Validation failures get their own title, everything else is "Error"
    pub fn from_error(error: &MediDashError) -> Self {
        let title = if error.is_validation() { "Validation Error" } else { "Error" };
        Self::destructive(title, error.to_string())
    }

    pub fn appointment_booked() -> Self {
        Self::success("Appointment Booked!", "Your appointment has been successfully scheduled.")
    }

    pub fn demo_appointment_saved(date: NaiveDate, time: NaiveTime) -> Self {
        Self::success(
            "Appointment Saved Locally",
            format!(
                "Demo doctor selected, so the {} {} booking was stored on this device only.",
                date.format("%Y-%m-%d"),
                time.format("%I:%M %p")
            ),
        )
    }

    pub fn appointment_updated(status_label: &str) -> Self {
        Self::success("Appointment Updated", format!("Status changed to {status_label}."))
    }

    pub fn prescription_issued(medication_count: usize) -> Self {
        let noun = if medication_count == 1 { "medication" } else { "medications" };
        Self::success(
            "Prescription Created",
            format!("Medical record and prescription with {medication_count} {noun} saved."),
        )
    }

    pub fn patient_registered(full_name: &str) -> Self {
        Self::success("Patient Registered", format!("{full_name} has been added to the patient registry."))
    }

    pub fn document_uploaded(file_name: &str) -> Self {
        Self::success("Document Uploaded", format!("{file_name} is awaiting verification."))
    }

    pub fn document_decided(status: VerificationStatus) -> Self {
        let (title, description) = match status {
            VerificationStatus::Verified => ("Document Verified", "The document has been marked as verified."),
            VerificationStatus::Rejected => ("Document Rejected", "The document has been marked as rejected."),
            VerificationStatus::Pending => ("Document Pending", "The document is awaiting verification."),
        };
        Self::success(title, description)
    }

    pub fn role_assigned(role: Role) -> Self {
        Self::success("Role Assigned", format!("User now has the {} role.", role.display_name()))
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, NotificationKind::Destructive)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            NotificationKind::Success => "✔",
            NotificationKind::Destructive => "✖",
        };
        write!(f, "{marker} {}\n  {}", self.title, self.description)
    }
}
