//! Role-based routing and capabilities
//!
//! Routing is a pure lookup: the signed-in user's role decides which dashboard
//! a request lands on and which actions are enabled. Row-level access is still
//! enforced by the backend; these checks only keep the UI honest.

use std::fmt;
use std::str::FromStr;

use crate::auth::CurrentUser;
use crate::error::{MediDashError, Result};
use crate::models::Role;

/// Navigable views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Auth,
    Home,
    Dashboard,
    RoleDashboard(Role),
}

impl Route {
    /// URL path of the view
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Landing => "/".to_string(),
            Self::Auth => "/auth".to_string(),
            Self::Home => "/home".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::RoleDashboard(role) => format!("/dashboard/{}", role_segment(*role)),
        }
    }

    /// Routes that need a signed-in user
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Home | Self::Dashboard | Self::RoleDashboard(_))
    }
}

fn role_segment(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "super-admin",
        other => other.as_str(),
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = MediDashError;

    fn from_str(s: &str) -> Result<Self> {
        let path = s.trim().trim_end_matches('/');
        match path {
            "" => Ok(Self::Landing),
            "/auth" => Ok(Self::Auth),
            "/home" => Ok(Self::Home),
            "/dashboard" => Ok(Self::Dashboard),
            other => other
                .strip_prefix("/dashboard/")
                .and_then(Role::parse_lenient)
                .map(Self::RoleDashboard)
                .ok_or_else(|| MediDashError::NotFound(format!("No such page: {s}"))),
        }
    }
}

/// Where a visitor of the landing page ends up
#[must_use]
pub const fn landing_redirect(user: Option<&CurrentUser>) -> Route {
    if user.is_some() {
        Route::Home
    } else {
        Route::Landing
    }
}

/// Final route for `requested`, given who is asking
#[must_use]
pub fn resolve(user: Option<&CurrentUser>, requested: Route) -> Route {
    let Some(user) = user else {
        return if requested.is_protected() { Route::Auth } else { requested };
    };

    match requested {
        Route::Landing | Route::Auth => Route::Home,
        Route::Dashboard | Route::RoleDashboard(_) => user.role.map_or(Route::Landing, Route::RoleDashboard),
        other => other,
    }
}

/// Actions that are enabled per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageUsers,
    AssignRoles,
    SystemSettings,
    ViewAllAppointments,
    ScheduleAppointments,
    RegisterPatients,
    VerifyDocuments,
    CreatePrescriptions,
    ViewPatients,
    UpdateAppointmentStatus,
    ViewOwnRecords,
    BookOwnAppointment,
}

impl Capability {
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::ManageUsers => "manage users",
            Self::AssignRoles => "assign roles",
            Self::SystemSettings => "change system settings",
            Self::ViewAllAppointments => "view all appointments",
            Self::ScheduleAppointments => "schedule appointments",
            Self::RegisterPatients => "register patients",
            Self::VerifyDocuments => "verify documents",
            Self::CreatePrescriptions => "create prescriptions",
            Self::ViewPatients => "view patients",
            Self::UpdateAppointmentStatus => "update appointment status",
            Self::ViewOwnRecords => "view own records",
            Self::BookOwnAppointment => "book an appointment",
        }
    }
}

/// Capabilities enabled for `role`
#[must_use]
pub fn capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;

    match role {
        Role::SuperAdmin => &[
            ManageUsers,
            AssignRoles,
            SystemSettings,
            ViewAllAppointments,
            ScheduleAppointments,
            UpdateAppointmentStatus,
            RegisterPatients,
            VerifyDocuments,
            ViewPatients,
            BookOwnAppointment,
        ],
        Role::Admin => &[
            ManageUsers,
            SystemSettings,
            ViewAllAppointments,
            ScheduleAppointments,
            UpdateAppointmentStatus,
            RegisterPatients,
            VerifyDocuments,
            ViewPatients,
            BookOwnAppointment,
        ],
        Role::Doctor => &[CreatePrescriptions, ViewPatients, UpdateAppointmentStatus, BookOwnAppointment],
        Role::Patient => &[ViewOwnRecords, BookOwnAppointment],
        Role::Nurse => &[ViewPatients, UpdateAppointmentStatus, BookOwnAppointment],
        Role::Receptionist => &[
            ScheduleAppointments,
            RegisterPatients,
            UpdateAppointmentStatus,
            ViewAllAppointments,
            ViewPatients,
            BookOwnAppointment,
        ],
    }
}

/// True when `user` may perform `capability`
#[must_use]
pub fn can(user: &CurrentUser, capability: Capability) -> bool {
    match user.role {
        Some(role) => capabilities(role).contains(&capability),
        // booking for yourself needs only a session
        None => capability == Capability::BookOwnAppointment,
    }
}

/// Fail with [`MediDashError::Forbidden`] unless `user` may perform `capability`
pub fn require(user: &CurrentUser, capability: Capability) -> Result<()> {
    if can(user, capability) {
        Ok(())
    } else {
        let role = user.role.map_or("no role", |r| r.display_name());
        Err(MediDashError::Forbidden(format!("{role} cannot {}", capability.describe())))
    }
}
