//! Integration tests for the session lifecycle and the auth gate.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use iems_core::auth_gate::{AuthState, GateDecision, IdentityStatus};
use iems_core::profile::{Profile, ProfileDraft, ADDRESS_REQUIRED};
use iems_core::roles::Role;
use iems_core::routes::{Dashboard, Route};
use iems_remote::{InMemoryRemote, Operation};
use iems_sync::{AuthGate, QueryState, StaticIdentityProvider, SyncError};

use common::{profile, session, ScriptedProvider};

const STUDENT_DASHBOARD: Route = Route::Dashboard(Dashboard::Student);

fn profile_with(name: &str, address: &str, role: Role, phone: &str) -> Profile {
    Profile {
        name: name.into(),
        role,
        address: address.into(),
        phone: phone.into(),
    }
}

// ---------------------------------------------------------------------------
// Test: unauthenticated access
// ---------------------------------------------------------------------------

/// With no stored identity a protected route redirects to role selection
/// and no profile fetch is attempted.
#[tokio::test]
async fn protected_route_without_identity_redirects_home() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::new(None));
    let gate = AuthGate::new(session.clone());

    assert_eq!(gate.state().await, AuthState::Initializing);
    assert_eq!(gate.navigate(&STUDENT_DASHBOARD).await, GateDecision::Loading);

    assert_eq!(session.initialize().await, Ok(IdentityStatus::Absent));
    assert_eq!(
        gate.navigate(&STUDENT_DASHBOARD).await,
        GateDecision::Redirect(Route::RoleSelection)
    );
    assert_eq!(
        gate.navigate(&Route::Login { role: None }).await,
        GateDecision::Render(Route::Login { role: None })
    );
    assert_eq!(remote.calls(Operation::GetCallerUserProfile), 0);
}

/// A failing profile fetch fails closed, and stays failed across
/// navigations until the profile is explicitly refetched.
#[tokio::test]
async fn profile_fetch_failure_is_unauthenticated() {
    let remote = InMemoryRemote::new();
    remote.fail_next(Operation::GetCallerUserProfile, "Replica unavailable");
    let session = session(&remote, StaticIdentityProvider::new(Some("p-1".into())));
    session.initialize().await.unwrap();

    let gate = AuthGate::new(session.clone());
    assert_eq!(gate.state().await, AuthState::Unauthenticated);
    assert_eq!(
        gate.navigate(&Route::Profile).await,
        GateDecision::Redirect(Route::RoleSelection)
    );
    assert_eq!(
        gate.navigate(&STUDENT_DASHBOARD).await,
        GateDecision::Redirect(Route::RoleSelection)
    );
    assert_eq!(remote.calls(Operation::GetCallerUserProfile), 1, "never retried");

    let client = session.client();
    assert_eq!(
        client.refetch(&client.caller_profile_query()).await,
        QueryState::Ready(None)
    );
    assert_eq!(
        gate.navigate(&Route::Profile).await,
        GateDecision::Redirect(Route::ProfileCompletion)
    );
}

/// A gate check that overlaps a profile edit settles on the edited
/// profile instead of reporting that it is still loading.
#[tokio::test(start_paused = true)]
async fn gate_overlapping_profile_edit_settles() {
    let remote = InMemoryRemote::new();
    remote.seed_profile("p-1", profile("A", Role::Student, "555"));
    let session = session(&remote, StaticIdentityProvider::new(Some("p-1".into())));
    session.initialize().await.unwrap();

    remote.delay_next(Operation::GetCallerUserProfile, Duration::from_secs(2));
    let gate = AuthGate::new(session.clone());
    let pending = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.navigate(&Route::Profile).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    session
        .client()
        .update_profile(profile("B", Role::Student, "555"))
        .await
        .unwrap();

    assert_eq!(pending.await.unwrap(), GateDecision::Render(Route::Profile));
    assert_eq!(remote.calls(Operation::GetCallerUserProfile), 2);
    assert_eq!(session.current_profile().await.unwrap().name, "B");
}

// ---------------------------------------------------------------------------
// Test: login and profile completion
// ---------------------------------------------------------------------------

/// Logging in without a profile lands on profile completion; completing it
/// lands on the dashboard of the role picked at login.
#[tokio::test]
async fn first_login_completes_profile_then_reaches_dashboard() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::signed_out("p-1"));
    let gate = AuthGate::new(session.clone());
    session.initialize().await.unwrap();

    session.login(Some(Role::Teacher), " 555 ").await.unwrap();
    assert_eq!(gate.state().await, AuthState::AuthenticatedNoProfile);
    assert_eq!(
        gate.navigate(&Route::Dashboard(Dashboard::Teacher)).await,
        GateDecision::Redirect(Route::ProfileCompletion)
    );

    let next = session
        .complete_profile(ProfileDraft::new("Ada", "1 School Lane"))
        .await
        .unwrap();
    assert_eq!(next, Route::Dashboard(Dashboard::Teacher));

    assert_eq!(gate.state().await, AuthState::AuthenticatedWithProfile(Role::Teacher));
    assert_eq!(
        gate.navigate(&next).await,
        GateDecision::Render(Route::Dashboard(Dashboard::Teacher))
    );

    let saved = session.current_profile().await.unwrap();
    assert_eq!(saved.phone, "555");
    assert_eq!(saved.name, "Ada");
}

/// A student saving `{A, X, 555}` reaches the student dashboard.
#[tokio::test]
async fn saved_student_profile_renders_student_dashboard() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::signed_out("p-1"));
    let gate = AuthGate::new(session.clone());
    session.login(Some(Role::Student), "555").await.unwrap();

    assert_eq!(
        gate.navigate(&STUDENT_DASHBOARD).await,
        GateDecision::Redirect(Route::ProfileCompletion)
    );
    session
        .complete_profile(ProfileDraft::new("A", "X"))
        .await
        .unwrap();

    assert_eq!(
        gate.navigate(&STUDENT_DASHBOARD).await,
        GateDecision::Render(STUDENT_DASHBOARD)
    );
    assert_eq!(
        session.current_profile().await.unwrap(),
        profile_with("A", "X", Role::Student, "555")
    );
}

/// Blank form fields are rejected before anything is saved.
#[tokio::test]
async fn profile_completion_requires_address() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::signed_out("p-1"));
    session.login(None, "555").await.unwrap();

    let result = session.complete_profile(ProfileDraft::new("Ada", "  ")).await;
    assert_eq!(result, Err(SyncError::Validation(ADDRESS_REQUIRED.to_string())));
    assert_eq!(remote.calls(Operation::SaveCallerUserProfile), 0);
}

/// A blank phone stops the login before the provider is asked.
#[tokio::test]
async fn login_requires_phone() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::signed_out("p-1"));

    assert_matches!(session.login(Some(Role::Student), "").await, Err(SyncError::Validation(_)));
    assert_eq!(session.identity_status().await, IdentityStatus::Initializing);
}

/// The chairperson login carries the chairperson role into completion.
#[tokio::test]
async fn chairperson_login_lands_on_chairperson_dashboard() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::signed_out("chair"));
    session.login_chairperson("900").await.unwrap();

    let next = session
        .complete_profile(ProfileDraft::new("Grace", "Head Office"))
        .await
        .unwrap();
    assert_eq!(next, Route::Dashboard(Dashboard::Chairperson));
}

/// Completion without a login intent sends the user back to the start.
#[tokio::test]
async fn completion_without_intent_returns_to_role_selection() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::new(Some("p-1".into())));
    session.initialize().await.unwrap();

    let next = session
        .complete_profile(ProfileDraft::new("Ada", "1 School Lane"))
        .await
        .unwrap();
    assert_eq!(next, Route::RoleSelection);
    assert_eq!(remote.calls(Operation::SaveCallerUserProfile), 0);
}

// ---------------------------------------------------------------------------
// Test: profile editing
// ---------------------------------------------------------------------------

/// Editing keeps role and phone, and the edit can be undone.
#[tokio::test]
async fn profile_edit_is_undoable() {
    let remote = InMemoryRemote::new();
    remote.seed_profile("p-1", profile("Ada", Role::Student, "555"));
    let session = session(&remote, StaticIdentityProvider::new(Some("p-1".into())));
    session.initialize().await.unwrap();

    let offer = session
        .edit_profile(ProfileDraft::new("Ada L.", "2 Mill Road"))
        .await
        .unwrap();
    let edited = session.current_profile().await.unwrap();
    assert_eq!(edited.name, "Ada L.");
    assert_eq!(edited.role, Role::Student);

    session.client().undo(&offer).await.unwrap();
    assert_eq!(session.current_profile().await.unwrap().name, "Ada");
}

/// Editing before completion reports the missing profile.
#[tokio::test]
async fn profile_edit_without_profile_fails() {
    let remote = InMemoryRemote::new();
    let session = session(&remote, StaticIdentityProvider::new(Some("p-1".into())));
    session.initialize().await.unwrap();

    let result = session.edit_profile(ProfileDraft::new("A", "B")).await;
    assert_eq!(result, Err(SyncError::ProfileMissing));
}

// ---------------------------------------------------------------------------
// Test: logout
// ---------------------------------------------------------------------------

/// Logout clears identity, cache and undo offers, and returns home.
#[tokio::test]
async fn logout_purges_everything() {
    let remote = InMemoryRemote::new();
    remote.seed_profile("p-1", profile("Ada", Role::Teacher, "555"));
    let session = session(&remote, StaticIdentityProvider::new(Some("p-1".into())));
    let gate = AuthGate::new(session.clone());
    session.initialize().await.unwrap();

    assert_eq!(gate.state().await, AuthState::AuthenticatedWithProfile(Role::Teacher));
    let offer = session
        .client()
        .update_fee("555", iems_core::fee::Fee::new(iems_core::fee::FeeStatus::Paid, 1))
        .await
        .unwrap();

    assert_eq!(session.logout().await, Route::RoleSelection);

    assert_eq!(session.identity_status().await, IdentityStatus::Absent);
    assert!(session.client().cache().is_empty().await);
    assert!(!session.client().can_undo(&offer));
    assert_eq!(session.client().caller_profile().await, QueryState::Disabled);
    assert_eq!(
        gate.navigate(&Route::Dashboard(Dashboard::Teacher)).await,
        GateDecision::Redirect(Route::RoleSelection)
    );
}

// ---------------------------------------------------------------------------
// Test: switching identities
// ---------------------------------------------------------------------------

/// Logging in as someone else while the caller profile is being watched
/// never shows the previous identity's profile, however the watch task
/// interleaves with the login.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn relogin_does_not_show_previous_profile() {
    for _ in 0..50 {
        let remote = InMemoryRemote::new();
        remote.seed_profile("p-1", profile("T", Role::Teacher, "555"));
        let session = session(&remote, ScriptedProvider::new(Some("p-1"), vec![Ok("p-2")]));
        session.initialize().await.unwrap();

        let client = Arc::clone(session.client());
        let mut watch = client.watch(client.caller_profile_query());
        watch.wait_for(|s| s.is_ready()).await;

        session.login(Some(Role::Student), "777").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(client.caller_profile().await, QueryState::Ready(None));
        assert_eq!(
            AuthGate::new(session.clone()).navigate(&STUDENT_DASHBOARD).await,
            GateDecision::Redirect(Route::ProfileCompletion)
        );
        drop(watch);
    }
}

/// A failed login drops the intent of the earlier one, so profile
/// completion cannot pick up a stale role.
#[tokio::test]
async fn failed_login_clears_previous_intent() {
    let remote = InMemoryRemote::new();
    let provider = ScriptedProvider::new(
        None,
        vec![Ok("p-1"), Err(SyncError::AuthenticationMissing)],
    );
    let session = session(&remote, provider);

    session.login(Some(Role::Teacher), "555").await.unwrap();
    assert_eq!(
        session.login_intent().await.map(|intent| intent.role),
        Some(Role::Teacher)
    );

    assert_eq!(
        session.login(Some(Role::Student), "777").await,
        Err(SyncError::AuthenticationMissing)
    );
    assert_eq!(session.login_intent().await, None);

    let draft = ProfileDraft::new("A", "X");
    assert_eq!(session.complete_profile(draft).await, Ok(Route::RoleSelection));
    assert_eq!(remote.calls(Operation::SaveCallerUserProfile), 0);
}
