//! Role dashboards
//!
//! Each role gets a fixed layout (title, subtitle, three action panels) plus
//! four stat cards and an agenda filled from live backend counts.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::auth::CurrentUser;
use crate::booking::slot_label;
use crate::error::Result;
use crate::fallback::LocalStore;
use crate::models::{Appointment, AppointmentStatus, Role, VerificationStatus};
use crate::query::QueryBuilder;
use crate::prescription::still_valid;
use crate::records::{doctor_for_user, names_by_id, patient_for_user};
use crate::repository::{fetch_all, DataClient};
use crate::schema::{appointments, doctors, documents, medical_records, patients, prescriptions, profiles, user_roles};

/// Application name shown in the header bar
pub const APP_NAME: &str = "MediDash Plus";

/// Message for users without a role row
pub const NO_ROLE_MESSAGE: &str = "No role assigned. Please contact your administrator.";

/// Quick-action card on a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPanel {
    pub title: &'static str,
    pub description: &'static str,
    pub actions: [&'static str; 3],
}

/// Static part of a role dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardLayout {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub panels: [ActionPanel; 3],
    pub agenda_title: &'static str,
}

const fn panel(title: &'static str, description: &'static str, actions: [&'static str; 3]) -> ActionPanel {
    ActionPanel { title, description, actions }
}

const SUPER_ADMIN_LAYOUT: DashboardLayout = DashboardLayout {
    title: "Super Admin Dashboard",
    subtitle: "Full system access and user management",
    panels: [
        panel("User Management", "Manage all users and roles", ["Manage Users", "Assign Roles", "View Activity Logs"]),
        panel(
            "System Settings",
            "Configure system parameters",
            ["Database Settings", "Backup & Restore", "System Logs"],
        ),
        panel("Security", "Manage security settings", ["Access Control", "Audit Trail", "Security Policies"]),
    ],
    agenda_title: "Today's Appointments",
};

const ADMIN_LAYOUT: DashboardLayout = DashboardLayout {
    title: "Admin Dashboard",
    subtitle: "Hospital operations and staff management",
    panels: [
        panel("Staff Management", "Manage doctors, nurses, and staff", ["Manage Doctors", "Manage Nurses", "Staff Schedule"]),
        panel("Appointments", "View and manage appointments", ["View All", "Today's Schedule", "Pending Approvals"]),
        panel("Document Verification", "Review uploaded documents", ["Pending", "View All Documents", "Verification History"]),
    ],
    agenda_title: "Today's Schedule Overview",
};

const DOCTOR_LAYOUT: DashboardLayout = DashboardLayout {
    title: "Doctor Dashboard",
    subtitle: "Patient records, appointments, and prescriptions",
    panels: [
        panel("My Patients", "View assigned patients", ["View All Patients", "Search Patient", "Recent Visits"]),
        panel("Appointments", "Manage your schedule", ["Today's Schedule", "Upcoming Appointments", "Set Availability"]),
        panel("Prescriptions", "Create and manage prescriptions", ["Create Prescription", "View Recent", "Upload Reports"]),
    ],
    agenda_title: "Upcoming Appointments",
};

const PATIENT_LAYOUT: DashboardLayout = DashboardLayout {
    title: "Patient Dashboard",
    subtitle: "Your appointments, medical records, and documents",
    panels: [
        panel("Appointments", "Schedule and manage appointments", ["Book Appointment", "View Upcoming", "History"]),
        panel("Medical Records", "View your medical history", ["View Records", "Download Reports", "Vitals History"]),
        panel("My Documents", "Download prescriptions and reports", ["Prescriptions", "Lab Reports", "Scans & X-rays"]),
    ],
    agenda_title: "Upcoming Appointments",
};

const NURSE_LAYOUT: DashboardLayout = DashboardLayout {
    title: "Nurse Dashboard",
    subtitle: "Patient care records and medication tracking",
    panels: [
        panel("My Patients", "View assigned patients", ["View All", "Active Patients", "Recent Updates"]),
        panel("Vital Signs", "Update patient vitals", ["Update Vitals", "View Trends", "Alerts"]),
        panel("Medications", "Track medications", ["Due Medications", "Administer", "Schedule"]),
    ],
    agenda_title: "Today's Appointments",
};

const RECEPTIONIST_LAYOUT: DashboardLayout = DashboardLayout {
    title: "Receptionist Dashboard",
    subtitle: "Appointment scheduling and patient registration",
    panels: [
        panel("Patient Registration", "Register new patients", ["Register Patient", "Search Patient", "Update Information"]),
        panel("Appointments", "Schedule appointments", ["Book Appointment", "View Schedule", "Reschedule"]),
        panel("Front Desk", "Manage front desk operations", ["Check In Patients", "Waiting List", "Messages"]),
    ],
    agenda_title: "Upcoming Appointments",
};

/// One of the four counters at the top of a dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub title: &'static str,
    pub value: usize,
    pub caption: &'static str,
}

/// Start and end of the local calendar `day`, as UTC instants
///
/// Row timestamps are stored in UTC while dashboard days follow the local clock.
#[must_use]
pub fn local_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = |date: NaiveDate| {
        let naive = date.and_time(NaiveTime::MIN);
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
    };
    let next = day.checked_add_days(Days::new(1)).unwrap_or(day);
    (midnight(day), midnight(next))
}

const fn stat(title: &'static str, value: usize, caption: &'static str) -> StatCard {
    StatCard { title, value, caption }
}

/// Where an agenda entry is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Backend,
    LocalDemo,
}

/// Appointment line with names resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaItem {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Patient name on staff views, doctor name on the patient view
    pub counterpart: String,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub origin: Origin,
}

/// Header bar contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBar {
    pub email: String,
    pub initials: String,
    pub role_label: &'static str,
}

impl HeaderBar {
    #[must_use]
    pub fn for_user(user: &CurrentUser) -> Self {
        Self {
            email: user.email.clone().unwrap_or_default(),
            initials: user.initials(),
            role_label: user.role_label(),
        }
    }
}

/// A rendered dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardView {
    /// Signed in but without a role
    NoRole { header: HeaderBar },
    Role {
        header: HeaderBar,
        role: Role,
        layout: &'static DashboardLayout,
        stats: Vec<StatCard>,
        agenda: Vec<AgendaItem>,
    },
}

impl DashboardView {
    /// Static layout of the dashboard for `role`
    #[must_use]
    pub const fn layout(role: Role) -> &'static DashboardLayout {
        match role {
            Role::SuperAdmin => &SUPER_ADMIN_LAYOUT,
            Role::Admin => &ADMIN_LAYOUT,
            Role::Doctor => &DOCTOR_LAYOUT,
            Role::Patient => &PATIENT_LAYOUT,
            Role::Nurse => &NURSE_LAYOUT,
            Role::Receptionist => &RECEPTIONIST_LAYOUT,
        }
    }
}

impl fmt::Display for HeaderBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{APP_NAME}  [{}] {}", self.initials, self.email)?;
        if !self.role_label.is_empty() {
            write!(f, " ({})", self.role_label)?;
        }
        Ok(())
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRole { header } => {
                writeln!(f, "{header}")?;
                writeln!(f)?;
                write!(f, "{NO_ROLE_MESSAGE}")
            },
            Self::Role { header, layout, stats, agenda, .. } => {
                writeln!(f, "{header}")?;
                writeln!(f)?;
                writeln!(f, "{}", layout.title)?;
                writeln!(f, "{}", layout.subtitle)?;
                writeln!(f)?;
                for card in stats {
                    writeln!(f, "  {:<24}{:>6}  {}", card.title, card.value, card.caption)?;
                }
                for panel in &layout.panels {
                    writeln!(f)?;
                    writeln!(f, "[{}] {}", panel.title, panel.description)?;
                    for action in panel.actions {
                        writeln!(f, "  - {action}")?;
                    }
                }
                writeln!(f)?;
                write!(f, "{}", layout.agenda_title)?;
                if agenda.is_empty() {
                    write!(f, "\n  Nothing scheduled")?;
                }
                for item in agenda {
                    write!(
                        f,
                        "\n  {} {}  {:<24}{:<20}{}",
                        item.date.format("%Y-%m-%d"),
                        slot_label(item.time),
                        item.counterpart,
                        item.reason.as_deref().unwrap_or("-"),
                        item.status.label()
                    )?;
                    if item.origin == Origin::LocalDemo {
                        write!(f, " (demo, stored locally)")?;
                    }
                }
                Ok(())
            },
        }
    }
}

/// Loads stat counts and agendas for a dashboard
pub struct DashboardService {
    client: Arc<dyn DataClient>,
    demo_store: Option<Arc<LocalStore>>,
}

impl DashboardService {
    pub fn new(client: Arc<dyn DataClient>, demo_store: Option<Arc<LocalStore>>) -> Self {
        Self { client, demo_store }
    }

    fn client(&self) -> &dyn DataClient {
        self.client.as_ref()
    }

    pub async fn load(&self, user: &CurrentUser, today: NaiveDate) -> Result<DashboardView> {
        let header = HeaderBar::for_user(user);
        let Some(role) = user.role else {
            return Ok(DashboardView::NoRole { header });
        };

        let (stats, agenda) = match role {
            Role::SuperAdmin => self.super_admin(today).await?,
            Role::Admin => self.admin(today).await?,
            Role::Doctor => self.doctor(user, today).await?,
            Role::Patient => self.patient(user, today).await?,
            Role::Nurse => self.nurse(today).await?,
            Role::Receptionist => self.receptionist(today).await?,
        };
        debug!(role = %role, stats = stats.len(), agenda = agenda.len(), "Dashboard loaded");

        Ok(DashboardView::Role { header, role, layout: DashboardView::layout(role), stats, agenda })
    }

    async fn count(&self, table: &str, query: QueryBuilder) -> Result<usize> {
        self.client().count(table, &query).await
    }

    fn today_query(today: NaiveDate) -> QueryBuilder {
        QueryBuilder::new()
            .eq(appointments::APPOINTMENT_DATE, today)
            .order_asc(appointments::APPOINTMENT_TIME)
    }

    /// Appointments on `today`, labelled with patient names
    async fn todays_schedule(&self, query: QueryBuilder) -> Result<Vec<AgendaItem>> {
        let rows: Vec<Appointment> = fetch_all(self.client(), appointments::TABLE, &query).await?;
        let names = names_by_id(self.client(), patients::TABLE, rows.iter().map(|a| a.patient_id)).await?;
        Ok(rows
            .into_iter()
            .map(|a| AgendaItem {
                counterpart: names.get(&a.patient_id).cloned().unwrap_or_else(|| "Unknown patient".to_string()),
                date: a.appointment_date,
                time: a.appointment_time,
                reason: a.reason,
                status: a.status,
                origin: Origin::Backend,
            })
            .collect())
    }

    async fn super_admin(&self, today: NaiveDate) -> Result<(Vec<StatCard>, Vec<AgendaItem>)> {
        let stats = vec![
            stat("Total Users", self.count(profiles::TABLE, QueryBuilder::new()).await?, "Registered accounts"),
            stat("Active Roles", self.count(user_roles::TABLE, QueryBuilder::new()).await?, "Role assignments"),
            stat(
                "Pending Documents",
                self.count(
                    documents::TABLE,
                    QueryBuilder::new().eq(documents::VERIFICATION_STATUS, VerificationStatus::Pending),
                )
                .await?,
                "Awaiting verification",
            ),
            stat("Total Appointments", self.count(appointments::TABLE, QueryBuilder::new()).await?, "All time"),
        ];
        Ok((stats, self.todays_schedule(Self::today_query(today)).await?))
    }

    async fn admin(&self, today: NaiveDate) -> Result<(Vec<StatCard>, Vec<AgendaItem>)> {
        let agenda = self.todays_schedule(Self::today_query(today)).await?;
        let stats = vec![
            stat(
                "Total Staff",
                self.count(user_roles::TABLE, QueryBuilder::new().neq(user_roles::ROLE, Role::Patient)).await?,
                "All non-patient roles",
            ),
            stat("Today's Appointments", agenda.len(), "Scheduled today"),
            stat(
                "Pending Documents",
                self.count(
                    documents::TABLE,
                    QueryBuilder::new().eq(documents::VERIFICATION_STATUS, VerificationStatus::Pending),
                )
                .await?,
                "Awaiting verification",
            ),
            stat("Registered Patients", self.count(patients::TABLE, QueryBuilder::new()).await?, "In the registry"),
        ];
        Ok((stats, agenda))
    }

    async fn doctor(&self, user: &CurrentUser, today: NaiveDate) -> Result<(Vec<StatCard>, Vec<AgendaItem>)> {
        let Some(doctor) = doctor_for_user(self.client(), user.id).await? else {
            let stats = vec![
                stat("My Patients", 0, "No doctor profile"),
                stat("Today's Appointments", 0, "No doctor profile"),
                stat("Prescriptions", 0, "No doctor profile"),
                stat("Pending Reviews", 0, "No doctor profile"),
            ];
            return Ok((stats, Vec::new()));
        };

        let mine = QueryBuilder::new().eq(appointments::DOCTOR_ID, doctor.id);
        let patient_rows = self
            .client()
            .select(appointments::TABLE, &mine.clone().select(&[appointments::PATIENT_ID]))
            .await?;
        let mut patient_ids: Vec<&str> = patient_rows
            .iter()
            .filter_map(|row| row.get(appointments::PATIENT_ID).and_then(|v| v.as_str()))
            .collect();
        patient_ids.sort_unstable();
        patient_ids.dedup();

        let agenda = self.todays_schedule(Self::today_query(today).eq(appointments::DOCTOR_ID, doctor.id)).await?;
        let stats = vec![
            stat("My Patients", patient_ids.len(), "Assigned"),
            stat("Today's Appointments", agenda.len(), "On your schedule"),
            stat(
                "Prescriptions",
                self.count(prescriptions::TABLE, QueryBuilder::new().eq(prescriptions::DOCTOR_ID, doctor.id)).await?,
                "Issued",
            ),
            stat(
                "Pending Reviews",
                self.count(appointments::TABLE, mine.eq(appointments::STATUS, AppointmentStatus::Pending)).await?,
                "Action needed",
            ),
        ];
        Ok((stats, agenda))
    }

    async fn patient(&self, user: &CurrentUser, today: NaiveDate) -> Result<(Vec<StatCard>, Vec<AgendaItem>)> {
        let mut agenda = Vec::new();
        let (mut records, mut prescription_count, mut document_count) = (0, 0, 0);

        if let Some(patient) = patient_for_user(self.client(), user.id).await? {
            let upcoming = QueryBuilder::new()
                .eq(appointments::PATIENT_ID, patient.id)
                .gte(appointments::APPOINTMENT_DATE, today)
                .order_asc(appointments::APPOINTMENT_DATE)
                .order_asc(appointments::APPOINTMENT_TIME);
            let rows: Vec<Appointment> = fetch_all(self.client(), appointments::TABLE, &upcoming).await?;
            let rows: Vec<Appointment> = rows.into_iter().filter(|a| a.status.is_upcoming()).collect();
            let names = names_by_id(self.client(), doctors::TABLE, rows.iter().map(|a| a.doctor_id)).await?;
            agenda.extend(rows.into_iter().map(|a| AgendaItem {
                counterpart: names.get(&a.doctor_id).cloned().unwrap_or_else(|| "Unknown doctor".to_string()),
                date: a.appointment_date,
                time: a.appointment_time,
                reason: a.reason,
                status: a.status,
                origin: Origin::Backend,
            }));

            records = self
                .count(medical_records::TABLE, QueryBuilder::new().eq(medical_records::PATIENT_ID, patient.id))
                .await?;
            prescription_count = self
                .count(prescriptions::TABLE, QueryBuilder::new().eq(prescriptions::PATIENT_ID, patient.id))
                .await?;
            document_count = self
                .count(documents::TABLE, QueryBuilder::new().eq(documents::PATIENT_ID, patient.id))
                .await?;
        }

        if let Some(store) = &self.demo_store {
            agenda.extend(
                store
                    .demo_appointments(Some(user.id))?
                    .into_iter()
                    .filter(|a| a.appointment_date >= today && a.status.is_upcoming())
                    .map(|a| AgendaItem {
                        date: a.appointment_date,
                        time: a.appointment_time,
                        counterpart: a.doctor_name,
                        reason: a.reason,
                        status: a.status,
                        origin: Origin::LocalDemo,
                    }),
            );
        }
        agenda.sort_by_key(|item| (item.date, item.time));

        let stats = vec![
            stat("Upcoming Appointments", agenda.len(), "Scheduled visits"),
            stat("Medical Records", records, "All records"),
            stat("Prescriptions", prescription_count, "All prescriptions"),
            stat("Documents", document_count, "Uploaded"),
        ];
        Ok((stats, agenda))
    }

    async fn nurse(&self, today: NaiveDate) -> Result<(Vec<StatCard>, Vec<AgendaItem>)> {
        let agenda = self.todays_schedule(Self::today_query(today)).await?;

        let active = self.count(prescriptions::TABLE, still_valid(QueryBuilder::new(), today)).await?;
        let completed = agenda.iter().filter(|a| a.status == AppointmentStatus::Completed).count();

        let stats = vec![
            stat("Registered Patients", self.count(patients::TABLE, QueryBuilder::new()).await?, "In the registry"),
            stat("Today's Appointments", agenda.len(), "Scheduled today"),
            stat("Active Prescriptions", active, "Currently valid"),
            stat("Completed Today", completed, "Visits finished"),
        ];
        Ok((stats, agenda))
    }

    async fn receptionist(&self, today: NaiveDate) -> Result<(Vec<StatCard>, Vec<AgendaItem>)> {
        let agenda = self.todays_schedule(Self::today_query(today)).await?;
        let checked_in = agenda.iter().filter(|a| a.status == AppointmentStatus::Confirmed).count();

        let (start, end) = local_day_bounds(today);
        let new_patients = self
            .count(patients::TABLE, QueryBuilder::new().gte(patients::CREATED_AT, start).lt(patients::CREATED_AT, end))
            .await?;
        let awaiting = self
            .count(
                appointments::TABLE,
                QueryBuilder::new()
                    .eq(appointments::STATUS, AppointmentStatus::Pending)
                    .gte(appointments::APPOINTMENT_DATE, today),
            )
            .await?;

        let stats = vec![
            stat("Today's Appointments", agenda.len(), "Scheduled today"),
            stat("New Patients", new_patients, "Registered today"),
            stat("Checked In", checked_in, "Confirmed today"),
            stat("Awaiting Confirmation", awaiting, "Pending requests"),
        ];
        Ok((stats, agenda))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_every_role_has_three_panels_of_three_actions() {
        for role in Role::ALL {
            let layout = DashboardView::layout(role);
            assert!(layout.title.ends_with("Dashboard"));
            assert!(layout.panels.iter().all(|p| p.actions.iter().all(|a| !a.is_empty())));
        }
    }

    #[test]
    fn test_no_role_renders_message() {
        let user = CurrentUser { id: Uuid::nil(), email: Some("new@clinic.org".into()), role: None };
        let view = DashboardView::NoRole { header: HeaderBar::for_user(&user) };
        let text = view.to_string();
        assert!(text.contains(NO_ROLE_MESSAGE));
        assert!(text.contains("[NE]"));
    }
}
