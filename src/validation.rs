use chrono::{Months, NaiveDate};
use regex::Regex;

use crate::error::{MediDashError, Result};

/// Message shown when a required form field is empty
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// Genders accepted at patient registration
pub const GENDERS: [&str; 3] = ["male", "female", "other"];

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Every `(label, value)` pair must be non-blank
    pub fn validate_required(fields: &[(&str, &str)]) -> Result<()> {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            tracing::debug!(fields = ?missing, "Required fields missing");
            Err(MediDashError::validation(REQUIRED_FIELDS_MESSAGE))
        }
    }

    /// Validate a person's display name
    pub fn validate_person_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(MediDashError::validation("Name cannot be empty"));
        }

        if name.chars().count() > 100 {
            return Err(MediDashError::validation("Name too long (max 100 characters)"));
        }

        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(MediDashError::validation("Name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate phone number format
    pub fn validate_phone(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Err(MediDashError::validation("Phone number cannot be empty"));
        }

        if phone
            .chars()
            .any(|c| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ')))
        {
            return Err(MediDashError::validation("Phone number contains invalid characters"));
        }

        let digits_only = phone.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits_only) {
            return Err(MediDashError::validation("Phone number must be between 7 and 15 digits"));
        }

        if phone.trim_start().get(1..).is_some_and(|rest| rest.contains('+')) {
            return Err(MediDashError::validation("Phone number may only start with +"));
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(MediDashError::validation("Email cannot be empty"));
        }

        if email.len() > 254 {
            return Err(MediDashError::validation("Email too long (max 254 characters)"));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(MediDashError::validation("Email must have exactly one @ symbol"));
        }

        let (local_part, domain_part) = (parts[0], parts[1]);

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(MediDashError::validation("Email local part invalid"));
        }

        if domain_part.is_empty()
            || !domain_part.contains('.')
            || domain_part.starts_with('.')
            || domain_part.ends_with('.')
        {
            return Err(MediDashError::validation("Email domain invalid"));
        }

        Ok(())
    }

    /// ABO group with Rh sign, e.g. `AB+`
    pub fn validate_blood_group(group: &str) -> Result<()> {
        let pattern = Regex::new(r"^(A|B|AB|O)[+-]$")
            .map_err(|e| MediDashError::Other(format!("Failed to compile blood group pattern: {e}")))?;

        if pattern.is_match(group.trim()) {
            Ok(())
        } else {
            Err(MediDashError::validation(format!("Invalid blood group: {group}")))
        }
    }

    pub fn validate_gender(gender: &str) -> Result<()> {
        if GENDERS.contains(&gender.trim().to_lowercase().as_str()) {
            Ok(())
        } else {
            Err(MediDashError::validation(format!(
                "Invalid gender: {gender}. Must be one of: {GENDERS:?}"
            )))
        }
    }

    /// Date of birth must be in the past and within a human lifespan
    pub fn validate_date_of_birth(date_of_birth: NaiveDate, today: NaiveDate) -> Result<()> {
        if date_of_birth > today {
            return Err(MediDashError::validation("Date of birth cannot be in the future"));
        }

        let oldest = today.checked_sub_months(Months::new(150 * 12)).unwrap_or(NaiveDate::MIN);
        if date_of_birth < oldest {
            return Err(MediDashError::validation("Date of birth is more than 150 years ago"));
        }

        Ok(())
    }

    /// `date` must be today or later
    pub fn validate_not_past(date: NaiveDate, today: NaiveDate, what: &str) -> Result<()> {
        if date < today {
            return Err(MediDashError::validation(format!("{what} cannot be in the past")));
        }
        Ok(())
    }

    /// Parse a `YYYY-MM-DD` form value
    pub fn parse_date(value: &str, what: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| MediDashError::validation(format!("Invalid {what}: {value}. Use YYYY-MM-DD")))
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Sanitized text, or `None` when nothing is left
    #[must_use]
    pub fn optional_text(text: Option<&str>) -> Option<String> {
        text.map(Self::sanitize_text).filter(|s| !s.is_empty())
    }

    /// Validate the backend base URL
    pub fn validate_backend_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(MediDashError::InvalidConfig("Backend URL cannot be empty".to_string()));
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MediDashError::InvalidConfig(format!(
                "Backend URL must start with http:// or https://: {url}"
            )));
        }

        if url.len() > 1000 {
            return Err(MediDashError::InvalidConfig("Backend URL too long".to_string()));
        }

        Ok(())
    }
}
