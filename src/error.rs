//! Error types for the medidash library.
//!
//! Every fallible operation in the crate returns [`Result`]. The command-line
//! front end turns any [`MediDashError`] into a user-facing notification.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the medidash application.
#[derive(Error, Debug)]
pub enum MediDashError {
    /// Transport-level failure talking to the backend
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("{message}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// Message extracted from the backend error body
        message: String,
    },

    /// A row the operation depends on does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client-side form validation failed
    #[error("{0}")]
    Validation(String),

    /// The current role does not enable this action
    #[error("Not permitted: {0}")]
    Forbidden(String),

    /// No signed-in session
    #[error("Not signed in. Run `medidash login` first")]
    Unauthenticated,

    /// The medical record was written but the prescription insert failed
    #[error("Medical record {medical_record_id} was saved but the prescription was not: {source}")]
    IncompletePrescription {
        /// Identifier of the medical record row that was created
        medical_record_id: Uuid,
        /// Failure of the prescription insert
        #[source]
        source: Box<MediDashError>,
    },

    /// The backend returned a response the client did not expect
    #[error("Unexpected response from {table}: {detail}")]
    UnexpectedResponse {
        /// Table the request targeted
        table: String,
        /// What was wrong with the response
        detail: String,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Local store errors
    #[error("Local store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl MediDashError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True when the error came from client-side validation
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Short label used as the `type` of the error counter
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Forbidden(_) => "forbidden",
            Self::Unauthenticated => "unauthenticated",
            Self::IncompletePrescription { .. } => "incomplete_prescription",
            Self::UnexpectedResponse { .. } => "unexpected_response",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Bincode(_) | Self::Csv(_) => "serialization",
            Self::Store(_) => "store",
            Self::InvalidConfig(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Result with MediDashError
pub type Result<T> = std::result::Result<T, MediDashError>;

impl From<anyhow::Error> for MediDashError {
    fn from(err: anyhow::Error) -> Self {
        MediDashError::Other(err.to_string())
    }
}

impl From<sled::Error> for MediDashError {
    fn from(err: sled::Error) -> Self {
        MediDashError::Store(err.to_string())
    }
}
