//! Head counts shown on the chairperson dashboard.

use serde::Serialize;

use crate::profile::Profile;
use crate::roles::Role;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub total_users: usize,
    pub students: usize,
    pub teachers: usize,
    pub staff: usize,
}

impl RoleSummary {
    /// Count profiles per role. Chairpersons and unknown roles only count
    /// toward the total.
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        profiles.iter().fold(
            Self {
                total_users: profiles.len(),
                ..Default::default()
            },
            |mut summary, profile| {
                match profile.role {
                    Role::Student => summary.students += 1,
                    Role::Teacher => summary.teachers += 1,
                    Role::NonTeachingStaff => summary.staff += 1,
                    Role::Chairperson | Role::Other(_) => {}
                }
                summary
            },
        )
    }
}
