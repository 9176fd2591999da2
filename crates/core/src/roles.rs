//! Profile roles and access-control roles.
//!
//! Profile roles travel as plain strings (`"Student"`, `"Teacher"`, ...).
//! Unknown strings are preserved verbatim so a profile written by a newer
//! service round-trips unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::routes::Dashboard;

pub const ROLE_STUDENT: &str = "Student";
pub const ROLE_TEACHER: &str = "Teacher";
pub const ROLE_CHAIRPERSON: &str = "Chairperson";
pub const ROLE_NON_TEACHING_STAFF: &str = "NonTeachingStaff";

/// Roles offered on the role selection screen. The chairperson signs in
/// through a dedicated login route instead.
pub const SELECTABLE_ROLES: &[&str] = &[ROLE_STUDENT, ROLE_TEACHER, ROLE_NON_TEACHING_STAFF];

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The role recorded on a [`Profile`](crate::profile::Profile).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Student,
    Teacher,
    Chairperson,
    NonTeachingStaff,
    /// Any role string this client does not know about.
    Other(String),
}

impl Role {
    /// Convert from the wire string value.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            ROLE_STUDENT => Self::Student,
            ROLE_TEACHER => Self::Teacher,
            ROLE_CHAIRPERSON => Self::Chairperson,
            ROLE_NON_TEACHING_STAFF => Self::NonTeachingStaff,
            other => Self::Other(other.to_string()),
        }
    }

    /// Convert to the wire string value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Student => ROLE_STUDENT,
            Self::Teacher => ROLE_TEACHER,
            Self::Chairperson => ROLE_CHAIRPERSON,
            Self::NonTeachingStaff => ROLE_NON_TEACHING_STAFF,
            Self::Other(s) => s,
        }
    }

    /// The dashboard a user with this role lands on.
    ///
    /// Unknown roles fall back to the student dashboard.
    pub fn dashboard(&self) -> Dashboard {
        match self {
            Self::Teacher => Dashboard::Teacher,
            Self::Chairperson => Dashboard::Chairperson,
            Self::NonTeachingStaff => Dashboard::NonTeaching,
            Self::Student | Self::Other(_) => Dashboard::Student,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Student
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::from_str_value(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

/// Access-control role held by the remote service for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_round_trip_through_strings() {
        for value in [ROLE_STUDENT, ROLE_TEACHER, ROLE_CHAIRPERSON, ROLE_NON_TEACHING_STAFF] {
            let role = Role::from_str_value(value);
            assert!(!matches!(role, Role::Other(_)), "{value} should be known");
            assert_eq!(role.as_str(), value);
        }
    }

    #[test]
    fn unknown_role_is_preserved() {
        let role = Role::from("Librarian".to_string());
        assert_eq!(role, Role::Other("Librarian".into()));
        assert_eq!(String::from(role), "Librarian");
    }

    #[test]
    fn dashboard_mapping() {
        assert_eq!(Role::Student.dashboard(), Dashboard::Student);
        assert_eq!(Role::Teacher.dashboard(), Dashboard::Teacher);
        assert_eq!(Role::Chairperson.dashboard(), Dashboard::Chairperson);
        assert_eq!(Role::NonTeachingStaff.dashboard(), Dashboard::NonTeaching);
        assert_eq!(Role::Other("Janitor".into()).dashboard(), Dashboard::Student);
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::NonTeachingStaff).unwrap();
        assert_eq!(json, "\"NonTeachingStaff\"");
        let back: Role = serde_json::from_str("\"Teacher\"").unwrap();
        assert_eq!(back, Role::Teacher);
    }

    #[test]
    fn user_role_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let guest: UserRole = serde_json::from_str("\"guest\"").unwrap();
        assert_eq!(guest, UserRole::Guest);
    }

    #[test]
    fn chairperson_is_not_selectable() {
        assert!(!SELECTABLE_ROLES.contains(&ROLE_CHAIRPERSON));
        assert_eq!(SELECTABLE_ROLES.len(), 3);
    }
}
