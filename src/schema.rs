//! Backend schema definitions
//!
//! Table and column names of the hosted schema. The tables themselves are owned
//! by the backend service; these constants keep query strings in one place.

/// Profiles table schema
pub mod profiles {
    /// Table name
    pub const TABLE: &str = "profiles";
    /// Primary key column, equal to the auth user id
    pub const ID: &str = "id";
    /// Display name column
    pub const FULL_NAME: &str = "full_name";
    /// Phone number column
    pub const PHONE: &str = "phone";
}

/// User roles table schema
pub mod user_roles {
    /// Table name
    pub const TABLE: &str = "user_roles";
    /// Primary key column
    pub const ID: &str = "id";
    /// Auth user column
    pub const USER_ID: &str = "user_id";
    /// Role column
    pub const ROLE: &str = "role";
}

/// Doctors table schema
pub mod doctors {
    /// Table name
    pub const TABLE: &str = "doctors";
    /// Primary key column
    pub const ID: &str = "id";
    /// Auth user column
    pub const USER_ID: &str = "user_id";
    /// Display name column
    pub const FULL_NAME: &str = "full_name";
    /// Specialization column
    pub const SPECIALIZATION: &str = "specialization";
}

/// Patients table schema
pub mod patients {
    /// Table name
    pub const TABLE: &str = "patients";
    /// Primary key column
    pub const ID: &str = "id";
    /// Auth user column, null for walk-in registrations
    pub const USER_ID: &str = "user_id";
    /// Display name column
    pub const FULL_NAME: &str = "full_name";
    /// Row creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Appointments table schema
pub mod appointments {
    /// Table name
    pub const TABLE: &str = "appointments";
    /// Primary key column
    pub const ID: &str = "id";
    /// Patient foreign key column
    pub const PATIENT_ID: &str = "patient_id";
    /// Doctor foreign key column
    pub const DOCTOR_ID: &str = "doctor_id";
    /// Visit day column
    pub const APPOINTMENT_DATE: &str = "appointment_date";
    /// Visit time column
    pub const APPOINTMENT_TIME: &str = "appointment_time";
    /// Status column
    pub const STATUS: &str = "status";
    /// Creating user column
    pub const CREATED_BY: &str = "created_by";
}

/// Medical records table schema
pub mod medical_records {
    /// Table name
    pub const TABLE: &str = "medical_records";
    /// Primary key column
    pub const ID: &str = "id";
    /// Patient foreign key column
    pub const PATIENT_ID: &str = "patient_id";
    /// Doctor foreign key column
    pub const DOCTOR_ID: &str = "doctor_id";
    /// Record day column
    pub const RECORD_DATE: &str = "record_date";
}

/// Prescriptions table schema
pub mod prescriptions {
    /// Table name
    pub const TABLE: &str = "prescriptions";
    /// Primary key column
    pub const ID: &str = "id";
    /// Patient foreign key column
    pub const PATIENT_ID: &str = "patient_id";
    /// Doctor foreign key column
    pub const DOCTOR_ID: &str = "doctor_id";
    /// Medical record foreign key column
    pub const MEDICAL_RECORD_ID: &str = "medical_record_id";
    /// Issue day column
    pub const PRESCRIPTION_DATE: &str = "prescription_date";
    /// Expiry day column
    pub const VALID_UNTIL: &str = "valid_until";
    /// Row creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Documents table schema
pub mod documents {
    /// Table name
    pub const TABLE: &str = "documents";
    /// Primary key column
    pub const ID: &str = "id";
    /// Patient foreign key column
    pub const PATIENT_ID: &str = "patient_id";
    /// Review state column
    pub const VERIFICATION_STATUS: &str = "verification_status";
    /// Row creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}
