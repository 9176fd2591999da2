//! Identity lifecycle.
//!
//! A [`Session`] ties an [`IdentityProvider`] to a [`QueryClient`]: once an
//! identity is present, a remote port is built for it and attached; on
//! logout the port is detached and everything cached is dropped.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use iems_core::auth_gate::IdentityStatus;
use iems_core::profile::PHONE_REQUIRED;
use iems_core::roles::Role;
use iems_core::routes::Route;
use iems_core::types::{is_blank, Phone};
use iems_remote::RemoteDataPort;
use tokio::sync::{Mutex, RwLock};

use crate::client::QueryClient;
use crate::error::SyncError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// An authenticated principal, carried as an opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    token: String,
}

impl Identity {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity(..)")
    }
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Restore a previously stored identity, if any.
    async fn restore(&self) -> Result<Option<Identity>, SyncError>;
    /// Run the interactive login and return the new identity.
    async fn login(&self) -> Result<Identity, SyncError>;
    async fn logout(&self) -> Result<(), SyncError>;
}

/// Provider backed by a fixed token, e.g. one supplied through the
/// environment. Logging in again reuses the same token.
pub struct StaticIdentityProvider {
    token: Option<String>,
    stored: Mutex<Option<Identity>>,
}

impl StaticIdentityProvider {
    /// `token` is both the stored identity and the one login returns.
    pub fn new(token: Option<String>) -> Self {
        let token = token.filter(|t| !is_blank(t));
        Self {
            stored: Mutex::new(token.clone().map(Identity::new)),
            token,
        }
    }

    /// Nothing stored yet; login yields `token`.
    pub fn signed_out(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            stored: Mutex::new(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn restore(&self) -> Result<Option<Identity>, SyncError> {
        Ok(self.stored.lock().await.clone())
    }

    async fn login(&self) -> Result<Identity, SyncError> {
        let identity = self
            .token
            .clone()
            .map(Identity::new)
            .ok_or(SyncError::AuthenticationMissing)?;
        *self.stored.lock().await = Some(identity.clone());
        Ok(identity)
    }

    async fn logout(&self) -> Result<(), SyncError> {
        *self.stored.lock().await = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Builds the remote port for a signed-in identity.
pub type PortFactory =
    Arc<dyn Fn(&Identity) -> Result<Arc<dyn RemoteDataPort>, SyncError> + Send + Sync>;

/// Role and phone chosen on the login screen, kept until profile
/// completion reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIntent {
    pub role: Role,
    pub phone: Phone,
}

struct SessionState {
    status: IdentityStatus,
    identity: Option<Identity>,
    intent: Option<LoginIntent>,
}

pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    client: Arc<QueryClient>,
    connect: PortFactory,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        client: Arc<QueryClient>,
        connect: PortFactory,
    ) -> Self {
        Self {
            provider,
            client,
            connect,
            state: RwLock::new(SessionState {
                status: IdentityStatus::Initializing,
                identity: None,
                intent: None,
            }),
        }
    }

    pub fn client(&self) -> &Arc<QueryClient> {
        &self.client
    }

    pub async fn identity_status(&self) -> IdentityStatus {
        self.state.read().await.status
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.state.read().await.identity.clone()
    }

    pub async fn login_intent(&self) -> Option<LoginIntent> {
        self.state.read().await.intent.clone()
    }

    pub(crate) async fn require_identity(&self) -> Result<Identity, SyncError> {
        self.identity().await.ok_or(SyncError::AuthenticationMissing)
    }

    /// Restore a stored identity. A provider error counts as no identity.
    pub async fn initialize(&self) -> Result<IdentityStatus, SyncError> {
        match self.provider.restore().await {
            Ok(Some(identity)) => {
                self.adopt(identity).await?;
                tracing::info!("Restored stored identity");
            }
            Ok(None) => {
                self.state.write().await.status = IdentityStatus::Absent;
                tracing::info!("No stored identity");
            }
            Err(e) => {
                self.state.write().await.status = IdentityStatus::Absent;
                tracing::warn!(error = %e, "Identity restore failed");
            }
        }
        Ok(self.identity_status().await)
    }

    /// Log in for one of the selectable roles. `role` defaults to
    /// student when the login screen was opened without one.
    pub async fn login(&self, role: Option<Role>, phone: &str) -> Result<(), SyncError> {
        self.login_as(role.unwrap_or_default(), phone).await
    }

    /// Log in from the dedicated chairperson screen.
    pub async fn login_chairperson(&self, phone: &str) -> Result<(), SyncError> {
        self.login_as(Role::Chairperson, phone).await
    }

    async fn login_as(&self, role: Role, phone: &str) -> Result<(), SyncError> {
        if is_blank(phone) {
            return Err(SyncError::Validation(PHONE_REQUIRED.to_string()));
        }
        let intent = LoginIntent {
            role,
            phone: phone.trim().to_string(),
        };
        // An intent from an earlier attempt must not outlive a failed one.
        self.state.write().await.intent = None;

        let identity = self.provider.login().await.inspect_err(|e| {
            tracing::warn!(role = %intent.role, error = %e, "Login failed");
        })?;
        self.adopt(identity).await?;
        self.state.write().await.intent = Some(intent.clone());
        tracing::info!(role = %intent.role, "Logged in");
        Ok(())
    }

    async fn adopt(&self, identity: Identity) -> Result<(), SyncError> {
        let port = (self.connect)(&identity)?;
        {
            let mut state = self.state.write().await;
            state.identity = Some(identity);
            state.status = IdentityStatus::Present;
        }
        // Detached first so nothing refills the cache for the old identity.
        self.client.detach().await;
        self.client.purge().await;
        self.client.attach(port).await;
        Ok(())
    }

    /// Sign out and return where to navigate. Always succeeds locally,
    /// even if the provider fails to clear its own state.
    pub async fn logout(&self) -> Route {
        if let Err(e) = self.provider.logout().await {
            tracing::warn!(error = %e, "Identity provider logout failed");
        }
        {
            let mut state = self.state.write().await;
            state.identity = None;
            state.intent = None;
            state.status = IdentityStatus::Absent;
        }
        self.client.detach().await;
        self.client.purge().await;
        tracing::info!("Logged out");
        Route::RoleSelection
    }
}
