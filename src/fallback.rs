//! Local key-value store
//!
//! Holds the persisted session and appointments booked against demo doctors.
//! Demo bookings never reach the backend; they are listed with their origin and
//! can be cleared, but are not synchronized.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Session;
use crate::error::Result;
use crate::models::AppointmentStatus;

const SESSION_TREE: &str = "session";
const DEMO_APPOINTMENTS_TREE: &str = "demo_appointments";
const SESSION_KEY: &[u8] = b"current";

/// Appointment stored on this device only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoAppointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub specialization: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

pub struct LocalStore {
    db: sled::Db,
    session: sled::Tree,
    demo_appointments: sled::Tree,
}

impl LocalStore {
    /// Open or create the store under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        debug!(path = %path.display(), "Opened local store");
        Self::from_db(db)
    }

    /// Store that lives only as long as the value
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let session = db.open_tree(SESSION_TREE)?;
        let demo_appointments = db.open_tree(DEMO_APPOINTMENTS_TREE)?;
        Ok(Self { db, session, demo_appointments })
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let data = bincode::serialize(session)?;
        self.session.insert(SESSION_KEY, data)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn load_session(&self) -> Result<Option<Session>> {
        match self.session.get(SESSION_KEY)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn clear_session(&self) -> Result<()> {
        self.session.clear()?;
        self.db.flush()?;
        Ok(())
    }

    pub fn save_demo_appointment(&self, appointment: &DemoAppointment) -> Result<()> {
        let data = bincode::serialize(appointment)?;
        self.demo_appointments.insert(appointment.id.as_bytes(), data)?;
        self.db.flush()?;
        info!(
            appointment_id = %appointment.id,
            doctor = %appointment.doctor_name,
            "Stored demo appointment locally"
        );
        Ok(())
    }

    /// Demo appointments ordered by date then time, optionally for one user
    pub fn demo_appointments(&self, user_id: Option<Uuid>) -> Result<Vec<DemoAppointment>> {
        let mut appointments = Vec::new();
        for entry in self.demo_appointments.iter() {
            let (_, data) = entry?;
            let appointment: DemoAppointment = bincode::deserialize(&data)?;
            if !matches!(user_id, Some(id) if id != appointment.user_id) {
                appointments.push(appointment);
            }
        }
        appointments.sort_by_key(|a| (a.appointment_date, a.appointment_time));
        Ok(appointments)
    }

    /// Discard every demo appointment, returning how many there were
    pub fn clear_demo_appointments(&self) -> Result<usize> {
        let count = self.demo_appointments.len();
        self.demo_appointments.clear()?;
        self.db.flush()?;
        info!(count, "Cleared demo appointments");
        Ok(count)
    }
}
