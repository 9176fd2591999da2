//! Route table.
//!
//! Paths follow the hash-router layout of the web client, so a leading
//! `#` is accepted and ignored by [`Route::parse`].

use std::fmt;

use crate::error::CoreError;
use crate::roles::Role;

pub const PATH_ROOT: &str = "/";
pub const PATH_LOGIN: &str = "/login";
pub const PATH_CHAIRPERSON_LOGIN: &str = "/chairperson-login";
pub const PATH_PROFILE_COMPLETION: &str = "/profile-completion";
pub const PATH_PROFILE: &str = "/profile";
pub const PATH_DASHBOARD_STUDENT: &str = "/dashboard/student";
pub const PATH_DASHBOARD_TEACHER: &str = "/dashboard/teacher";
pub const PATH_DASHBOARD_CHAIRPERSON: &str = "/dashboard/chairperson";
pub const PATH_DASHBOARD_NON_TEACHING: &str = "/dashboard/non-teaching";

/// One dashboard per role family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dashboard {
    Student,
    Teacher,
    Chairperson,
    NonTeaching,
}

impl Dashboard {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Student => PATH_DASHBOARD_STUDENT,
            Self::Teacher => PATH_DASHBOARD_TEACHER,
            Self::Chairperson => PATH_DASHBOARD_CHAIRPERSON,
            Self::NonTeaching => PATH_DASHBOARD_NON_TEACHING,
        }
    }
}

/// Every navigable view in the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: pick Student, Teacher or Non-Teaching Staff.
    RoleSelection,
    /// `/login?role=<Role>`: phone login for the selected role.
    Login { role: Option<Role> },
    /// `/chairperson-login`.
    ChairpersonLogin,
    /// `/profile-completion`: first-time profile form.
    ProfileCompletion,
    Dashboard(Dashboard),
    /// `/profile`: view and edit the caller's own profile.
    Profile,
}

impl Route {
    /// Parse a path such as `#/login?role=Teacher` or `/dashboard/student`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let without_hash = raw.trim().trim_start_matches('#');
        let (path, query) = match without_hash.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_hash, None),
        };

        let path = match path.trim_end_matches('/') {
            "" => PATH_ROOT,
            trimmed => trimmed,
        };

        let route = match path {
            PATH_ROOT => Self::RoleSelection,
            PATH_LOGIN => Self::Login {
                role: query.and_then(role_from_query),
            },
            PATH_CHAIRPERSON_LOGIN => Self::ChairpersonLogin,
            PATH_PROFILE_COMPLETION => Self::ProfileCompletion,
            PATH_PROFILE => Self::Profile,
            PATH_DASHBOARD_STUDENT => Self::Dashboard(Dashboard::Student),
            PATH_DASHBOARD_TEACHER => Self::Dashboard(Dashboard::Teacher),
            PATH_DASHBOARD_CHAIRPERSON => Self::Dashboard(Dashboard::Chairperson),
            PATH_DASHBOARD_NON_TEACHING => Self::Dashboard(Dashboard::NonTeaching),
            _ => return Err(CoreError::UnknownRoute(raw.to_string())),
        };

        Ok(route)
    }

    /// Render the route back to a path, including the login query string.
    pub fn path(&self) -> String {
        match self {
            Self::RoleSelection => PATH_ROOT.to_string(),
            Self::Login { role: Some(role) } => format!("{PATH_LOGIN}?role={role}"),
            Self::Login { role: None } => PATH_LOGIN.to_string(),
            Self::ChairpersonLogin => PATH_CHAIRPERSON_LOGIN.to_string(),
            Self::ProfileCompletion => PATH_PROFILE_COMPLETION.to_string(),
            Self::Dashboard(dashboard) => dashboard.path().to_string(),
            Self::Profile => PATH_PROFILE.to_string(),
        }
    }

    /// Protected routes sit behind the auth gate.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Dashboard(_) | Self::Profile)
    }

    /// The landing dashboard for a role.
    pub fn dashboard_for(role: &Role) -> Self {
        Self::Dashboard(role.dashboard())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn role_from_query(query: &str) -> Option<Role> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("role="))
        .filter(|value| !value.is_empty())
        .map(Role::from_str_value)
}
