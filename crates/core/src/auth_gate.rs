//! Auth gate decision.
//!
//! The gate sits in front of every protected route. Its outcome depends on
//! two asynchronously resolved facts: whether an identity is present, and
//! whether the caller's profile fetch came back absent. Everything here is
//! a pure function of those inputs; the sync crate resolves them.
//!
//! ```text
//! Initializing ──┬──> Unauthenticated            (no identity, or profile fetch failed)
//!                ├──> AuthenticatedNoProfile     (profile fetch returned absent)
//!                └──> AuthenticatedWithProfile   (profile fetch returned a profile)
//! ```

use crate::roles::Role;
use crate::routes::Route;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Identity provider lifecycle as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStatus {
    /// The provider has not finished restoring a stored identity.
    Initializing,
    Absent,
    Present,
}

/// Caller profile fetch as seen by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    /// Not fetched yet: disabled (no transport) or in flight.
    Pending,
    /// The fetch failed. Treated as unauthenticated.
    Failed,
    Absent,
    Present(Role),
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Initializing,
    Unauthenticated,
    /// Transient: left only by completing the profile.
    AuthenticatedNoProfile,
    AuthenticatedWithProfile(Role),
}

impl AuthState {
    /// Combine identity and profile status into a gate state.
    ///
    /// Identity absence wins over any profile status, so a stale profile
    /// left over from a previous session can never unlock the gate.
    pub fn resolve(identity: IdentityStatus, profile: &ProfileStatus) -> Self {
        match (identity, profile) {
            (IdentityStatus::Initializing, _) => Self::Initializing,
            (IdentityStatus::Absent, _) => Self::Unauthenticated,
            (IdentityStatus::Present, ProfileStatus::Pending) => Self::Initializing,
            (IdentityStatus::Present, ProfileStatus::Failed) => Self::Unauthenticated,
            (IdentityStatus::Present, ProfileStatus::Absent) => Self::AuthenticatedNoProfile,
            (IdentityStatus::Present, ProfileStatus::Present(role)) => {
                Self::AuthenticatedWithProfile(role.clone())
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::AuthenticatedWithProfile(_)
        )
    }

    /// Where a user in this state should be sent after signing in, or
    /// `None` while still initializing.
    pub fn landing(&self) -> Option<Route> {
        match self {
            Self::Initializing => None,
            Self::Unauthenticated => Some(Route::RoleSelection),
            Self::AuthenticatedNoProfile => Some(Route::ProfileCompletion),
            Self::AuthenticatedWithProfile(role) => Some(Route::dashboard_for(role)),
        }
    }
}

// ---------------------------------------------------------------------------
// GateDecision
// ---------------------------------------------------------------------------

/// What the router should do for a requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Show the loading indicator and re-evaluate once inputs settle.
    Loading,
    Redirect(Route),
    Render(Route),
}

impl GateDecision {
    /// The route that ends up on screen, if any.
    pub fn target(&self) -> Option<&Route> {
        match self {
            Self::Loading => None,
            Self::Redirect(route) | Self::Render(route) => Some(route),
        }
    }
}

/// Decide the outcome of navigating to `requested` in `state`.
///
/// Public routes always render. Protected routes fail closed: anything
/// other than a resolved profile redirects or waits.
pub fn decide(state: &AuthState, requested: &Route) -> GateDecision {
    if !requested.is_protected() {
        return GateDecision::Render(requested.clone());
    }

    match state {
        AuthState::Initializing => GateDecision::Loading,
        AuthState::Unauthenticated => GateDecision::Redirect(Route::RoleSelection),
        AuthState::AuthenticatedNoProfile => GateDecision::Redirect(Route::ProfileCompletion),
        AuthState::AuthenticatedWithProfile(_) => GateDecision::Render(requested.clone()),
    }
}
