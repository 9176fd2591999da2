//! Route guard driven by the live session.

use std::sync::Arc;

use iems_core::auth_gate::{decide, AuthState, GateDecision, IdentityStatus, ProfileStatus};
use iems_core::profile::Profile;
use iems_core::routes::Route;

use crate::cache::QueryState;
use crate::session::Session;

/// Map the caller-profile read onto the gate's profile input.
pub fn profile_status(state: &QueryState<Option<Profile>>) -> ProfileStatus {
    match state {
        QueryState::Disabled | QueryState::Loading => ProfileStatus::Pending,
        QueryState::Failed(_) => ProfileStatus::Failed,
        QueryState::Ready(None) => ProfileStatus::Absent,
        QueryState::Ready(Some(profile)) => ProfileStatus::Present(profile.role.clone()),
    }
}

/// Resolves [`AuthState`] from the session and the cached caller profile,
/// and decides every navigation.
#[derive(Clone)]
pub struct AuthGate {
    session: Arc<Session>,
}

impl AuthGate {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Current gate state. Fetches the caller profile when an identity is
    /// present and nothing fresh is cached.
    pub async fn state(&self) -> AuthState {
        let identity = self.session.identity_status().await;
        let profile = match identity {
            IdentityStatus::Present => profile_status(&self.session.client().caller_profile().await),
            IdentityStatus::Initializing | IdentityStatus::Absent => ProfileStatus::Pending,
        };
        AuthState::resolve(identity, &profile)
    }

    /// Decide what to show for `requested`.
    pub async fn navigate(&self, requested: &Route) -> GateDecision {
        let state = self.state().await;
        let decision = decide(&state, requested);
        match &decision {
            GateDecision::Redirect(to) => {
                tracing::info!(from = %requested, to = %to, state = ?state, "Redirecting");
            }
            GateDecision::Render(route) => tracing::debug!(route = %route, "Rendering"),
            GateDecision::Loading => tracing::debug!(route = %requested, "Waiting for auth state"),
        }
        decision
    }

    /// Where to go right after signing in, or `None` while still loading.
    pub async fn landing(&self) -> Option<Route> {
        self.state().await.landing()
    }
}

#[cfg(test)]
mod tests {
    use iems_core::roles::Role;

    use super::*;

    #[test]
    fn profile_states_map_to_gate_inputs() {
        let profile = Profile {
            name: "A".into(),
            role: Role::Teacher,
            address: "X".into(),
            phone: "555".into(),
        };
        assert_eq!(profile_status(&QueryState::Disabled), ProfileStatus::Pending);
        assert_eq!(profile_status(&QueryState::Loading), ProfileStatus::Pending);
        assert_eq!(
            profile_status(&QueryState::Failed("nope".into())),
            ProfileStatus::Failed
        );
        assert_eq!(profile_status(&QueryState::Ready(None)), ProfileStatus::Absent);
        assert_eq!(
            profile_status(&QueryState::Ready(Some(profile))),
            ProfileStatus::Present(Role::Teacher)
        );
    }
}
