//! The query client: cache, transport and undo offers in one handle.

use std::future::Future;
use std::sync::Arc;

use iems_remote::{RemoteDataPort, RemoteResult};
use tokio::sync::RwLock;

use crate::cache::{CacheEvent, Cacheable, Completion, QueryCache, QueryState};
use crate::config::{next_delay, SyncConfig};
use crate::error::SyncError;
use crate::key::Entity;
use crate::query::Query;
use crate::undo::{UndoOffer, UndoRegistry, UndoTarget};

/// How often a read retired in flight is issued again.
const MAX_REISSUES: u32 = 3;

/// Shared entry point for every read and write.
///
/// Reads go through [`QueryClient::fetch`] or a typed helper in
/// [`queries`](crate::queries). Writes live in
/// [`mutations`](crate::mutations). Until a port is attached every read
/// is [`QueryState::Disabled`] and every write fails with
/// [`SyncError::TransportUnavailable`].
pub struct QueryClient {
    cache: QueryCache,
    port: RwLock<Option<Arc<dyn RemoteDataPort>>>,
    undo: UndoRegistry,
    config: SyncConfig,
}

impl QueryClient {
    pub fn new(config: SyncConfig) -> Arc<Self> {
        Arc::new(Self {
            cache: QueryCache::new(),
            port: RwLock::new(None),
            undo: UndoRegistry::default(),
            config,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ---- transport ----

    /// Make `port` the transport for all subsequent calls. Reads still
    /// travelling through the previous port are discarded on arrival.
    pub async fn attach(&self, port: Arc<dyn RemoteDataPort>) {
        self.swap_port(Some(port)).await;
        tracing::debug!("Remote port attached");
        self.cache.publish(CacheEvent::TransportChanged);
    }

    pub async fn detach(&self) {
        self.swap_port(None).await;
        tracing::debug!("Remote port detached");
        self.cache.publish(CacheEvent::TransportChanged);
    }

    async fn swap_port(&self, port: Option<Arc<dyn RemoteDataPort>>) {
        let mut current = self.port.write().await;
        *current = port;
        self.cache.retire_in_flight().await;
    }

    pub async fn is_ready(&self) -> bool {
        self.port.read().await.is_some()
    }

    pub(crate) async fn port(&self) -> Option<Arc<dyn RemoteDataPort>> {
        self.port.read().await.clone()
    }

    pub(crate) async fn require_port(&self) -> Result<Arc<dyn RemoteDataPort>, SyncError> {
        self.port().await.ok_or(SyncError::TransportUnavailable)
    }

    /// Clear every cached value and every undo offer.
    pub async fn purge(&self) {
        self.undo.clear();
        self.cache.purge().await;
    }

    // ---- reads ----

    /// Return the cached value if fresh, otherwise fetch it. A query that
    /// keeps its failures returns a cached failure as is.
    pub async fn fetch<T: Cacheable>(&self, query: &Query<T>) -> QueryState<T> {
        if !query.is_enabled() || !self.is_ready().await {
            return QueryState::Disabled;
        }
        let key = query.key();
        if self.cache.is_fresh(key).await
            || (query.policy().keep_failure && self.cache.has_failed(key).await)
        {
            return self.cache.state(key).await;
        }
        self.refetch(query).await
    }

    /// Fetch unconditionally and return the resulting state.
    ///
    /// If a newer request for the same key landed first, that result wins.
    /// A read retired in flight by a write, a purge or a transport change
    /// is issued again, so the caller never gets an answer that predates
    /// the change.
    pub async fn refetch<T: Cacheable>(&self, query: &Query<T>) -> QueryState<T> {
        if !query.is_enabled() {
            return QueryState::Disabled;
        }
        let key = query.key();
        self.cache.evict_idle(self.config.cache_idle).await;

        let mut reissued = 0;
        loop {
            let Some((port, ticket)) = self.begin(query).await else {
                return QueryState::Disabled;
            };
            let outcome = self.run_with_retry(query, port).await;
            let stored = match &outcome {
                Ok(value) => Ok(value.clone().into_cached()),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Query failed");
                    Err(e.to_string())
                }
            };

            match self.cache.complete(key, ticket, stored).await {
                Completion::Stored => return self.cache.state(key).await,
                Completion::Superseded => {
                    if self.cache.is_fresh(key).await || self.cache.has_failed(key).await {
                        return self.cache.state(key).await;
                    }
                    // The newer request is still out and the cache only
                    // holds stale data; answer with ours.
                    return match outcome {
                        Ok(value) => QueryState::Ready(value),
                        Err(e) => QueryState::Failed(e.to_string()),
                    };
                }
                Completion::Retired if reissued < MAX_REISSUES => {
                    reissued += 1;
                    tracing::debug!(%key, reissued, "Read retired in flight, reissuing");
                }
                Completion::Retired => return self.cache.state(key).await,
            }
        }
    }

    /// Take the current port and a ticket under one read lock, so a port
    /// swap either happens before the ticket or retires it.
    async fn begin<T>(&self, query: &Query<T>) -> Option<(Arc<dyn RemoteDataPort>, u64)> {
        let current = self.port.read().await;
        let port = Arc::clone(current.as_ref()?);
        let ticket = self.cache.begin(query.key()).await;
        Some((port, ticket))
    }

    /// Current state without issuing a call.
    pub async fn peek<T: Cacheable>(&self, query: &Query<T>) -> QueryState<T> {
        if !query.is_enabled() || !self.is_ready().await {
            return QueryState::Disabled;
        }
        self.cache.state(query.key()).await
    }

    async fn run_with_retry<T: Cacheable>(
        &self,
        query: &Query<T>,
        port: Arc<dyn RemoteDataPort>,
    ) -> RemoteResult<T> {
        let retry = &self.config.retry;
        let mut delay = retry.initial_delay;
        let mut attempt = 0u32;

        loop {
            match query.run(Arc::clone(&port)).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < query.policy().retries => {
                    attempt += 1;
                    tracing::debug!(
                        key = %query.key(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying query",
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_delay(delay, retry);
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ---- writes ----

    /// Run a write and invalidate `entity` on success. A failed write
    /// leaves the cache untouched.
    pub(crate) async fn mutate<F, Fut>(
        &self,
        action: &'static str,
        entity: Entity,
        write: F,
    ) -> Result<(), SyncError>
    where
        F: FnOnce(Arc<dyn RemoteDataPort>) -> Fut,
        Fut: Future<Output = RemoteResult<()>>,
    {
        let port = self.require_port().await?;
        match write(port).await {
            Ok(()) => {
                tracing::info!(action, %entity, "Write succeeded");
                self.cache.invalidate(entity).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(action, %entity, error = %e, "Write failed");
                Err(e.into())
            }
        }
    }

    /// Run an undoable write and hand back its offer.
    pub(crate) async fn mutate_undoable<F, Fut>(
        &self,
        action: &'static str,
        target: UndoTarget,
        write: F,
    ) -> Result<UndoOffer, SyncError>
    where
        F: FnOnce(Arc<dyn RemoteDataPort>) -> Fut,
        Fut: Future<Output = RemoteResult<()>>,
    {
        self.mutate(action, target.entity(), write).await?;
        Ok(self.undo.offer(target))
    }

    /// Revert the write that produced `offer`.
    ///
    /// Fails with [`SyncError::UndoExpired`] if the offer was already used
    /// or replaced by a newer write to the same record. If the service
    /// rejects the undo the offer stays usable.
    pub async fn undo(&self, offer: &UndoOffer) -> Result<(), SyncError> {
        if !self.undo.take(offer) {
            return Err(SyncError::UndoExpired);
        }
        let target = offer.target().clone();
        let result = self
            .mutate("undo", target.entity(), |port| async move {
                target.run(port.as_ref()).await
            })
            .await;
        if result.is_err() {
            self.undo.restore(offer);
        }
        result
    }

    /// `true` while `offer` can still be used.
    pub fn can_undo(&self, offer: &UndoOffer) -> bool {
        self.undo.is_live(offer)
    }

    /// Undo the last write to `target` without an offer in hand.
    pub(crate) async fn undo_target(
        &self,
        action: &'static str,
        target: UndoTarget,
    ) -> Result<(), SyncError> {
        let entity = target.entity();
        let retired = target.clone();
        self.mutate(action, entity, |port| async move {
            target.run(port.as_ref()).await
        })
        .await?;
        self.undo.retire(&retired);
        Ok(())
    }
}
