//! Shared fixtures for sync integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use iems_core::profile::Profile;
use iems_core::roles::Role;
use iems_remote::{InMemoryRemote, RemoteDataPort};
use iems_sync::{
    Identity, IdentityProvider, PortFactory, QueryClient, Session, SyncConfig, SyncError,
};

/// Defaults with read retries off, so a single injected failure surfaces.
pub fn test_config() -> SyncConfig {
    SyncConfig {
        read_retries: 0,
        ..SyncConfig::default()
    }
}

/// A client already attached to `remote` acting as `principal`.
pub async fn attached_client(remote: &InMemoryRemote, principal: &str) -> Arc<QueryClient> {
    let client = QueryClient::new(test_config());
    client.attach(Arc::new(remote.as_caller(principal))).await;
    client
}

/// Port factory acting on `remote` as the identity's token.
pub fn connect_to(remote: &InMemoryRemote) -> PortFactory {
    let remote = remote.clone();
    Arc::new(move |identity: &Identity| {
        let port: Arc<dyn RemoteDataPort> = Arc::new(remote.as_caller(identity.token()));
        Ok(port)
    })
}

pub fn session(remote: &InMemoryRemote, provider: impl IdentityProvider + 'static) -> Arc<Session> {
    Arc::new(Session::new(
        Arc::new(provider),
        QueryClient::new(test_config()),
        connect_to(remote),
    ))
}

pub fn profile(name: &str, role: Role, phone: &str) -> Profile {
    Profile {
        name: name.to_string(),
        role,
        address: "1 School Lane".to_string(),
        phone: phone.to_string(),
    }
}

/// Provider restoring `stored` and answering logins in order from a
/// script. An exhausted script fails the login.
pub struct ScriptedProvider {
    stored: Mutex<Option<Identity>>,
    logins: Mutex<VecDeque<Result<Identity, SyncError>>>,
}

impl ScriptedProvider {
    pub fn new(stored: Option<&str>, logins: Vec<Result<&str, SyncError>>) -> Self {
        Self {
            stored: Mutex::new(stored.map(Identity::new)),
            logins: Mutex::new(logins.into_iter().map(|l| l.map(Identity::new)).collect()),
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn restore(&self) -> Result<Option<Identity>, SyncError> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn login(&self) -> Result<Identity, SyncError> {
        let next = self
            .logins
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SyncError::AuthenticationMissing));
        if let Ok(identity) = &next {
            *self.stored.lock().unwrap() = Some(identity.clone());
        }
        next
    }

    async fn logout(&self) -> Result<(), SyncError> {
        *self.stored.lock().unwrap() = None;
        Ok(())
    }
}
