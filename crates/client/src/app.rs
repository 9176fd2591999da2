//! Startup flow and the dashboard follow loop.

use std::sync::Arc;

use iems_core::auth_gate::GateDecision;
use iems_core::fee::Fee;
use iems_core::profile::Profile;
use iems_core::routes::{Dashboard, Route};
use iems_core::stats::RoleSummary;
use iems_remote::{HttpRemote, RemoteDataPort};
use iems_sync::cache::Cacheable;
use iems_sync::{
    AuthGate, Identity, NotificationFeed, PortFactory, QueryClient, QueryState, QueryWatch,
    Session, StaticIdentityProvider,
};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The start route needs a sign-in step first.
    Redirected(Route),
    /// A public route was rendered; there is nothing live to follow.
    Rendered(Route),
    /// Followed a protected route until shutdown.
    Stopped { notifications: usize },
}

/// Port factory talking HTTP to the configured service.
pub fn http_connector(config: &ClientConfig) -> PortFactory {
    let base_url = config.remote_url.clone();
    let timeout = config.request_timeout;
    Arc::new(move |identity: &Identity| {
        let remote =
            HttpRemote::new(base_url.clone(), Some(identity.token().to_string()), timeout)?;
        let port: Arc<dyn RemoteDataPort> = Arc::new(remote);
        Ok(port)
    })
}

/// Restore the session, resolve the start route and, if it renders a
/// protected view, follow its live data until `shutdown` fires.
pub async fn run(
    config: ClientConfig,
    connect: PortFactory,
    shutdown: CancellationToken,
) -> anyhow::Result<Outcome> {
    let client = QueryClient::new(config.sync.clone());
    let provider = Arc::new(StaticIdentityProvider::new(config.identity_token.clone()));
    let session = Arc::new(Session::new(provider, client, connect));
    let gate = AuthGate::new(Arc::clone(&session));

    let status = session.initialize().await?;
    tracing::info!(?status, "Session initialized");

    let route = match gate.navigate(&config.start_route).await {
        GateDecision::Render(route) => route,
        GateDecision::Redirect(route) => return Ok(Outcome::Redirected(route)),
        GateDecision::Loading => anyhow::bail!("Auth state did not settle"),
    };
    if !route.is_protected() {
        tracing::info!(%route, "Rendered public route");
        return Ok(Outcome::Rendered(route));
    }

    let profile = session.current_profile().await?;
    tracing::info!(%route, role = %profile.role, "Rendered dashboard");
    follow(&session, &route, &profile, shutdown).await
}

async fn follow(
    session: &Session,
    route: &Route,
    profile: &Profile,
    shutdown: CancellationToken,
) -> anyhow::Result<Outcome> {
    let client = session.client();

    if *route == Route::Dashboard(Dashboard::Chairperson) {
        match client.all_profiles().await {
            QueryState::Ready(profiles) => {
                let summary = RoleSummary::from_profiles(&profiles);
                tracing::info!(
                    total = summary.total_users,
                    students = summary.students,
                    teachers = summary.teachers,
                    staff = summary.staff,
                    "School summary",
                );
            }
            QueryState::Failed(e) => tracing::warn!(error = %e, "School summary unavailable"),
            QueryState::Disabled | QueryState::Loading => {}
        }
    }

    let mut fees = (*route == Route::Dashboard(Dashboard::Student))
        .then(|| client.watch(client.fees_query(&profile.phone)));
    let mut messages = client.watch(client.messages_query());
    let mut feed = NotificationFeed::for_recipient(profile.phone.clone());
    let mut notifications = 0;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!(notifications, "Stopping");
                break;
            }
            state = messages.changed() => match state {
                Some(QueryState::Ready(list)) => {
                    for message in feed.observe(&list) {
                        notifications += 1;
                        tracing::info!(
                            sender = %message.sender,
                            content = %message.content,
                            "New message",
                        );
                    }
                }
                Some(QueryState::Failed(e)) => tracing::warn!(error = %e, "Messages unavailable"),
                Some(_) => {}
                None => break,
            },
            Some(state) = next_change(&mut fees) => log_fee(&state),
        }
    }

    Ok(Outcome::Stopped { notifications })
}

/// Next state of an optional watch. Never resolves for `None`.
async fn next_change<T: Cacheable>(
    watch: &mut Option<QueryWatch<T>>,
) -> Option<QueryState<T>> {
    match watch {
        Some(watch) => watch.changed().await,
        None => std::future::pending().await,
    }
}

fn log_fee(state: &QueryState<Option<Fee>>) {
    match state {
        QueryState::Ready(Some(fee)) => tracing::info!(
            status = fee.status.as_str(),
            amount = fee.amount,
            outstanding = fee.status.is_outstanding(),
            "Fee status",
        ),
        QueryState::Ready(None) => tracing::info!("No fee record"),
        QueryState::Failed(e) => tracing::warn!(error = %e, "Fee status unavailable"),
        QueryState::Disabled | QueryState::Loading => {}
    }
}
