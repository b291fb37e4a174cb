//! Appointment booking
//!
//! Covers the self-service booking dialog, staff scheduling on behalf of a
//! patient, status changes and appointment listings. Doctors from the demo
//! catalogue are booked into the local store instead of the backend.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::config::BookingConfig;
use crate::error::{MediDashError, Result};
use crate::fallback::{DemoAppointment, LocalStore};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate, DoctorSummary, NewAppointment, NewPatient, Patient};
use crate::query::QueryBuilder;
use crate::records::patient_for_user;
use crate::repository::{fetch_all, fetch_optional, insert_one, update_where, DataClient};
use crate::router::{require, Capability};
use crate::schema::{appointments, doctors, patients};
use crate::validation::{InputValidator, REQUIRED_FIELDS_MESSAGE};

/// Bookable times of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlots {
    first: NaiveTime,
    last: NaiveTime,
    step_minutes: u32,
}

impl Default for TimeSlots {
    fn default() -> Self {
        Self {
            first: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            last: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            step_minutes: 30,
        }
    }
}

impl TimeSlots {
    pub fn new(first: NaiveTime, last: NaiveTime, step_minutes: u32) -> Result<Self> {
        if first > last || step_minutes == 0 {
            return Err(MediDashError::InvalidConfig(format!(
                "Invalid slot range {first}..{last} every {step_minutes} minutes"
            )));
        }
        Ok(Self { first, last, step_minutes })
    }

    pub fn from_config(config: &BookingConfig) -> Result<Self> {
        let (first, last) = config
            .slot_bounds()
            .map_err(|e| MediDashError::InvalidConfig(e.to_string()))?;
        Self::new(first, last, config.slot_minutes)
    }

    /// Every slot from first to last inclusive
    #[must_use]
    pub fn all(&self) -> Vec<NaiveTime> {
        let step = Duration::minutes(i64::from(self.step_minutes));
        let mut slots = Vec::new();
        let mut current = self.first;
        while current <= self.last {
            slots.push(current);
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            current = next;
        }
        slots
    }

    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.all().contains(&time)
    }
}

/// Slot label as shown in the picker, e.g. `09:30 AM`
#[must_use]
pub fn slot_label(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

const DEMO_DOCTORS: [(u128, &str, &str); 4] = [
    (0xdead_0000_0000_4000_8000_0000_0000_0001, "Dr. Emily Carter", "Cardiology"),
    (0xdead_0000_0000_4000_8000_0000_0000_0002, "Dr. James Wilson", "General Medicine"),
    (0xdead_0000_0000_4000_8000_0000_0000_0003, "Dr. Priya Sharma", "Pediatrics"),
    (0xdead_0000_0000_4000_8000_0000_0000_0004, "Dr. Robert Lee", "Orthopedics"),
];

/// Catalogue offered when the backend has no doctors
#[must_use]
pub fn demo_doctors() -> Vec<DoctorSummary> {
    DEMO_DOCTORS
        .iter()
        .map(|(id, name, specialization)| DoctorSummary {
            id: Uuid::from_u128(*id),
            full_name: (*name).to_string(),
            specialization: (*specialization).to_string(),
        })
        .collect()
}

#[must_use]
pub fn is_demo_doctor(id: Uuid) -> bool {
    DEMO_DOCTORS.iter().any(|(demo, _, _)| Uuid::from_u128(*demo) == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorSource {
    Remote,
    Demo,
}

/// Doctors offered by the booking form
#[derive(Debug, Clone)]
pub struct DoctorChoices {
    pub source: DoctorSource,
    pub doctors: Vec<DoctorSummary>,
}

impl DoctorChoices {
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&DoctorSummary> {
        self.doctors.iter().find(|d| d.id == id)
    }
}

/// Values entered in the booking dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentForm {
    pub doctor_id: Option<Uuid>,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub reason: String,
}

impl AppointmentForm {
    /// Clear every field after a successful submission
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

struct ValidForm {
    doctor_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub enum BookingOutcome {
    /// Written to the backend
    Booked(Appointment),
    /// Written to the local store because a demo doctor was chosen
    StoredLocally(DemoAppointment),
}

/// Appointments of one user, from both origins
#[derive(Debug, Clone, Default)]
pub struct MyAppointments {
    pub remote: Vec<Appointment>,
    pub local: Vec<DemoAppointment>,
}

pub struct BookingService {
    client: Arc<dyn DataClient>,
    demo_store: Option<Arc<LocalStore>>,
    slots: TimeSlots,
    metrics: MetricsCollector,
}

impl BookingService {
    /// `demo_store` enables the demo doctor fallback when present
    pub fn new(
        client: Arc<dyn DataClient>, demo_store: Option<Arc<LocalStore>>, slots: TimeSlots, metrics: MetricsCollector,
    ) -> Self {
        Self { client, demo_store, slots, metrics }
    }

    #[must_use]
    pub const fn slots(&self) -> &TimeSlots {
        &self.slots
    }

    /// Doctors for the picker, ordered by name
    pub async fn doctor_choices(&self) -> Result<DoctorChoices> {
        let query = QueryBuilder::new()
            .select(&[doctors::ID, doctors::FULL_NAME, doctors::SPECIALIZATION])
            .order_asc(doctors::FULL_NAME);
        let remote: Vec<DoctorSummary> = fetch_all(self.client.as_ref(), doctors::TABLE, &query).await?;

        if remote.is_empty() && self.demo_store.is_some() {
            debug!("No doctors in backend, offering demo catalogue");
            return Ok(DoctorChoices { source: DoctorSource::Demo, doctors: demo_doctors() });
        }
        Ok(DoctorChoices { source: DoctorSource::Remote, doctors: remote })
    }

    fn validate(&self, form: &AppointmentForm, today: NaiveDate) -> Result<ValidForm> {
        let (Some(doctor_id), Some(date), Some(time)) = (form.doctor_id, form.appointment_date, form.appointment_time)
        else {
            self.metrics.record_form_rejection("appointment");
            return Err(MediDashError::validation(REQUIRED_FIELDS_MESSAGE));
        };

        let checked = InputValidator::validate_not_past(date, today, "Appointment date").and_then(|()| {
            if self.slots.contains(time) {
                Ok(())
            } else {
                Err(MediDashError::validation(format!(
                    "{} is not an available time slot",
                    slot_label(time)
                )))
            }
        });
        if let Err(e) = checked {
            self.metrics.record_form_rejection("appointment");
            return Err(e);
        }

        Ok(ValidForm {
            doctor_id,
            date,
            time,
            reason: InputValidator::optional_text(Some(&form.reason)),
        })
    }

    /// Patient row of `user`, created on first use
    pub async fn ensure_patient(&self, user: &CurrentUser, today: NaiveDate) -> Result<Uuid> {
        if let Some(patient) = patient_for_user(self.client.as_ref(), user.id).await? {
            return Ok(patient.id);
        }

        let new_patient = NewPatient {
            user_id: Some(user.id),
            full_name: user.email_local_part().unwrap_or("Patient").to_string(),
            email: user.email.clone(),
            phone: String::new(),
            date_of_birth: today,
            gender: "other".to_string(),
            ..NewPatient::default()
        };
        let patient: Patient = insert_one(self.client.as_ref(), patients::TABLE, &new_patient).await?;
        info!(patient_id = %patient.id, user_id = %user.id, "Created patient record on first booking");
        Ok(patient.id)
    }

    /// Book an appointment for the signed-in user
    pub async fn book(&self, user: &CurrentUser, form: &AppointmentForm, today: NaiveDate) -> Result<BookingOutcome> {
        require(user, Capability::BookOwnAppointment)?;
        let timer = OperationTimer::new("book_appointment");
        let valid = self.validate(form, today)?;

        if is_demo_doctor(valid.doctor_id) {
            let demo = self.store_demo(user, &valid)?;
            timer.finish();
            return Ok(BookingOutcome::StoredLocally(demo));
        }

        let patient_id = self.ensure_patient(user, today).await?;
        let appointment = self.insert_appointment(patient_id, &valid, user.id).await?;
        timer.finish();
        Ok(BookingOutcome::Booked(appointment))
    }

    fn store_demo(&self, user: &CurrentUser, valid: &ValidForm) -> Result<DemoAppointment> {
        let Some(store) = self.demo_store.as_ref() else {
            return Err(MediDashError::NotFound(format!("Doctor {}", valid.doctor_id)));
        };
        let doctor = demo_doctors()
            .into_iter()
            .find(|d| d.id == valid.doctor_id)
            .ok_or_else(|| MediDashError::NotFound(format!("Doctor {}", valid.doctor_id)))?;

        let demo = DemoAppointment {
            id: Uuid::new_v4(),
            user_id: user.id,
            doctor_id: doctor.id,
            doctor_name: doctor.full_name,
            specialization: doctor.specialization,
            appointment_date: valid.date,
            appointment_time: valid.time,
            reason: valid.reason.clone(),
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        };
        store.save_demo_appointment(&demo)?;
        self.metrics.record_fallback_write();
        Ok(demo)
    }

    async fn insert_appointment(&self, patient_id: Uuid, valid: &ValidForm, created_by: Uuid) -> Result<Appointment> {
        let new_appointment = NewAppointment {
            patient_id,
            doctor_id: valid.doctor_id,
            appointment_date: valid.date,
            appointment_time: valid.time,
            reason: valid.reason.clone(),
            status: AppointmentStatus::Scheduled,
            created_by: Some(created_by),
        };
        let appointment: Appointment = insert_one(self.client.as_ref(), appointments::TABLE, &new_appointment).await?;
        info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            date = %appointment.appointment_date,
            "Appointment booked"
        );
        Ok(appointment)
    }

    /// Staff booking on behalf of an existing patient
    pub async fn schedule_for_patient(
        &self, staff: &CurrentUser, patient_id: Uuid, form: &AppointmentForm, today: NaiveDate,
    ) -> Result<Appointment> {
        require(staff, Capability::ScheduleAppointments)?;
        let timer = OperationTimer::new("schedule_appointment");
        let valid = self.validate(form, today)?;

        if is_demo_doctor(valid.doctor_id) {
            return Err(MediDashError::validation("Demo doctors can only be booked from the home page"));
        }

        let query = QueryBuilder::new().select(&[patients::ID]).eq(patients::ID, patient_id);
        let exists = !self.client.select(patients::TABLE, &query).await?.is_empty();
        if !exists {
            return Err(MediDashError::NotFound(format!("Patient {patient_id}")));
        }

        let appointment = self.insert_appointment(patient_id, &valid, staff.id).await?;
        timer.finish();
        Ok(appointment)
    }

    /// Change the status of an open appointment
    pub async fn update_status(
        &self, user: &CurrentUser, appointment_id: Uuid, status: AppointmentStatus,
    ) -> Result<Appointment> {
        require(user, Capability::UpdateAppointmentStatus)?;

        let open: Vec<&str> = AppointmentStatus::ALL
            .iter()
            .filter(|s| !s.is_terminal())
            .map(AppointmentStatus::as_str)
            .collect();
        let query = QueryBuilder::new()
            .eq(appointments::ID, appointment_id)
            .in_list(appointments::STATUS, open);
        let changes = AppointmentUpdate { status: Some(status), notes: None };

        let mut updated: Vec<Appointment> =
            update_where(self.client.as_ref(), appointments::TABLE, &query, &changes).await?;
        if let Some(appointment) = updated.pop() {
            info!(appointment_id = %appointment_id, status = %status, "Appointment status updated");
            return Ok(appointment);
        }

        let lookup = QueryBuilder::new().eq(appointments::ID, appointment_id);
        match fetch_optional::<Appointment>(self.client.as_ref(), appointments::TABLE, &lookup).await? {
            Some(existing) => {
                warn!(appointment_id = %appointment_id, status = %existing.status, "Refusing to reopen closed appointment");
                Err(MediDashError::validation(format!(
                    "Appointment is already {} and cannot be changed",
                    existing.status.label().to_lowercase()
                )))
            },
            None => Err(MediDashError::NotFound(format!("Appointment {appointment_id}"))),
        }
    }

    fn ordered() -> QueryBuilder {
        QueryBuilder::new()
            .order_asc(appointments::APPOINTMENT_DATE)
            .order_asc(appointments::APPOINTMENT_TIME)
    }

    pub async fn appointments_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>> {
        let query = Self::ordered().eq(appointments::PATIENT_ID, patient_id);
        fetch_all(self.client.as_ref(), appointments::TABLE, &query).await
    }

    pub async fn appointments_for_doctor_on(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>> {
        let query = Self::ordered()
            .eq(appointments::DOCTOR_ID, doctor_id)
            .eq(appointments::APPOINTMENT_DATE, date);
        fetch_all(self.client.as_ref(), appointments::TABLE, &query).await
    }

    /// Every appointment on `date`
    pub async fn appointments_on(&self, date: NaiveDate) -> Result<Vec<Appointment>> {
        let query = Self::ordered().eq(appointments::APPOINTMENT_DATE, date);
        fetch_all(self.client.as_ref(), appointments::TABLE, &query).await
    }

    /// Remote appointments of the user's patient record plus local demo bookings
    pub async fn appointments_for_user(&self, user: &CurrentUser) -> Result<MyAppointments> {
        let remote = match patient_for_user(self.client.as_ref(), user.id).await? {
            Some(patient) => self.appointments_for_patient(patient.id).await?,
            None => Vec::new(),
        };
        let local = match &self.demo_store {
            Some(store) => store.demo_appointments(Some(user.id))?,
            None => Vec::new(),
        };
        Ok(MyAppointments { remote, local })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockDataClient;

    fn patient_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: Some("pat@example.com".to_string()),
            role: Some(crate::models::Role::Patient),
        }
    }

    #[test]
    fn test_default_slots() {
        let slots = TimeSlots::default().all();
        assert_eq!(slots.len(), 17);
        assert_eq!(slot_label(slots[0]), "09:00 AM");
        assert_eq!(slot_label(slots[16]), "05:00 PM");
    }

    #[test]
    fn test_form_reset() {
        let mut form = AppointmentForm {
            doctor_id: Some(Uuid::new_v4()),
            reason: "checkup".to_string(),
            ..AppointmentForm::default()
        };
        form.reset();
        assert_eq!(form, AppointmentForm::default());
    }

    #[tokio::test]
    async fn test_missing_fields_never_reach_backend() {
        // no expectations: any backend call would panic
        let client = MockDataClient::new();
        let metrics = MetricsCollector::new();
        let service = BookingService::new(Arc::new(client), None, TimeSlots::default(), metrics.clone());
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        let err = service.book(&patient_user(), &AppointmentForm::default(), today).await.unwrap_err();
        assert_eq!(err.to_string(), REQUIRED_FIELDS_MESSAGE);
        assert_eq!(metrics.snapshot().form_rejections, 1);
    }

    #[tokio::test]
    async fn test_backend_failure_is_returned() {
        let mut client = MockDataClient::new();
        client.expect_select().returning(|_, _| Ok(Vec::new()));
        client
            .expect_insert()
            .returning(|_, _| Err(MediDashError::Api { status: 403, message: "permission denied".into() }));
        let service = BookingService::new(Arc::new(client), None, TimeSlots::default(), MetricsCollector::new());
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let form = AppointmentForm {
            doctor_id: Some(Uuid::new_v4()),
            appointment_date: Some(today),
            appointment_time: NaiveTime::from_hms_opt(10, 0, 0),
            reason: String::new(),
        };

        let err = service.book(&patient_user(), &form, today).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
    }
}
