//! `iems-client` -- headless IEMS client.
//!
//! Restores the configured identity, resolves the start route through the
//! auth gate and, on a dashboard, logs new messages (and fee changes for
//! students) until Ctrl+C.
//!
//! # Environment variables
//!
//! | Variable                    | Default                 | Description                      |
//! |-----------------------------|-------------------------|----------------------------------|
//! | `IEMS_REMOTE_URL`           | `http://localhost:4943` | Remote data service base URL     |
//! | `IEMS_IDENTITY_TOKEN`       | --                      | Bearer token of a stored identity |
//! | `IEMS_START_ROUTE`          | `/dashboard/student`    | Route requested at startup       |
//! | `IEMS_REQUEST_TIMEOUT_SECS` | `30`                    | Per-call HTTP timeout            |
//! | `IEMS_HOMEWORK_POLL_SECS`   | `10`                    | Homework refetch period          |
//! | `IEMS_FEE_POLL_SECS`        | `15`                    | Fee refetch period               |
//! | `IEMS_MESSAGE_POLL_SECS`    | `10`                    | Message refetch period           |
//! | `IEMS_READ_RETRIES`         | `3`                     | Retries after a failed read      |
//! | `IEMS_CACHE_IDLE_SECS`      | `300`                   | Idle time before cache eviction  |

use anyhow::Context;
use iems_client::app::{self, Outcome};
use iems_client::config::ClientConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iems_client=info,iems_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().context("Invalid IEMS_START_ROUTE")?;

    tracing::info!(
        remote_url = %config.remote_url,
        start_route = %config.start_route,
        signed_in = config.identity_token.is_some(),
        "Starting iems-client",
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    return;
                }
            }
            shutdown.cancel();
        }
    });

    let connect = app::http_connector(&config);
    match app::run(config, connect, shutdown).await? {
        Outcome::Redirected(route) => {
            tracing::info!(%route, "Sign-in required, open this route to continue");
        }
        Outcome::Rendered(route) => tracing::info!(%route, "Nothing to follow"),
        Outcome::Stopped { notifications } => {
            tracing::info!(notifications, "iems-client stopped");
        }
    }

    Ok(())
}
