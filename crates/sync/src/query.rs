//! Read descriptors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use iems_remote::{RemoteDataPort, RemoteResult};

use crate::key::QueryKey;

type Fetcher<T> =
    Arc<dyn Fn(Arc<dyn RemoteDataPort>) -> BoxFuture<'static, RemoteResult<T>> + Send + Sync>;

/// How a query is kept up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryPolicy {
    /// Refetch period while a [`QueryWatch`](crate::QueryWatch) is alive.
    pub poll_every: Option<Duration>,
    /// Retries after a failed fetch.
    pub retries: u32,
    /// Serve a failure from the cache instead of fetching again. Only an
    /// explicit refetch, an invalidation or a purge clears it.
    pub keep_failure: bool,
}

impl QueryPolicy {
    /// Fetched once, refetched only on invalidation.
    pub fn once() -> Self {
        Self::default()
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn polling(mut self, every: Duration) -> Self {
        self.poll_every = Some(every);
        self
    }

    pub fn keeping_failure(mut self) -> Self {
        self.keep_failure = true;
        self
    }
}

/// A named, parameterized read against the remote port.
pub struct Query<T> {
    key: QueryKey,
    policy: QueryPolicy,
    fetcher: Fetcher<T>,
}

impl<T: Send + 'static> Query<T> {
    pub fn new<F, Fut>(key: QueryKey, policy: QueryPolicy, fetch: F) -> Self
    where
        F: Fn(Arc<dyn RemoteDataPort>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RemoteResult<T>> + Send + 'static,
    {
        Self {
            key,
            policy,
            fetcher: Arc::new(move |port| fetch(port).boxed()),
        }
    }
}

impl<T> Query<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }

    /// Whether the query may run at all. Blank parameters disable it.
    pub fn is_enabled(&self) -> bool {
        self.key.is_complete()
    }

    pub(crate) fn run(&self, port: Arc<dyn RemoteDataPort>) -> BoxFuture<'static, RemoteResult<T>> {
        (self.fetcher)(port)
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            policy: self.policy,
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}
