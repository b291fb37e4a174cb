//! MediDash Plus - Role-Based Hospital Dashboard
//!
//! A Rust library and command-line client for a hospital management system
//! backed by a hosted Postgres REST service.
//!
//! # Features
//!
//! - Password sign-in with a persisted session
//! - Role-based routing to one dashboard per role
//! - Appointment booking, with a local fallback for demo doctors
//! - Prescriptions with structured medication lists
//! - Patient registration, document verification and role assignment
//! - Report export (TXT, CSV, JSON)

/// Sign-in, sessions and the current user
pub mod auth;
/// Appointment booking and listings
pub mod booking;
/// Configuration management
pub mod config;
/// Role dashboards
pub mod dashboard;
/// Error types
pub mod error;
/// Report export
pub mod export;
/// Local store for the session and demo bookings
pub mod fallback;
/// Logging setup and utilities
pub mod logging;
/// In-memory data client
pub mod memory;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// User-facing notifications
pub mod notify;
/// Prescription workflow
pub mod prescription;
/// Row filters, ordering and paging
pub mod query;
/// Patients, records, documents and roles
pub mod records;
/// Data client trait and typed helpers
pub mod repository;
/// REST data client
pub mod rest;
/// Role-based routing and capabilities
pub mod router;
/// Backend schema definitions
pub mod schema;
/// Service facade
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use auth::{AuthProvider, CurrentUser, RestAuth, Session};
pub use config::AppConfig;
pub use error::{MediDashError, Result};
pub use memory::MemoryClient;
pub use models::{AppointmentStatus, OutputFormat, Role, VerificationStatus};
pub use repository::DataClient;
pub use rest::RestClient;
pub use service::HospitalService;
