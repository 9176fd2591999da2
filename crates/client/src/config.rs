use std::time::Duration;

use iems_core::error::CoreError;
use iems_core::routes::Route;
use iems_sync::SyncConfig;

const DEFAULT_REMOTE_URL: &str = "http://localhost:4943";
const DEFAULT_START_ROUTE: &str = "/dashboard/student";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote data service.
    pub remote_url: String,
    /// Bearer token of a stored identity, if any.
    pub identity_token: Option<String>,
    /// Route requested at startup.
    pub start_route: Route,
    pub request_timeout: Duration,
    pub sync: SyncConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `IEMS_REMOTE_URL`           | `http://localhost:4943` |
    /// | `IEMS_IDENTITY_TOKEN`       | unset                   |
    /// | `IEMS_START_ROUTE`          | `/dashboard/student`    |
    /// | `IEMS_REQUEST_TIMEOUT_SECS` | `30`                    |
    ///
    /// Polling and retry variables are documented on [`SyncConfig::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let remote_url = lookup("IEMS_REMOTE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REMOTE_URL.into());

        let identity_token = lookup("IEMS_IDENTITY_TOKEN").filter(|v| !v.trim().is_empty());

        let start_route = Route::parse(
            &lookup("IEMS_START_ROUTE").unwrap_or_else(|| DEFAULT_START_ROUTE.into()),
        )?;

        let request_timeout_secs: u64 = lookup("IEMS_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            remote_url,
            identity_token,
            start_route,
            request_timeout: Duration::from_secs(request_timeout_secs),
            sync: SyncConfig::from_lookup(lookup),
        })
    }
}
