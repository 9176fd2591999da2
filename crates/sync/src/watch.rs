//! Live views over a query.
//!
//! A [`QueryWatch`] owns a background task that keeps one query current:
//! it fetches on start, refetches on every poll tick and whenever the
//! query's family is invalidated, and re-reads the cache when another
//! caller stores a newer result. A watched key is never evicted from the
//! cache. Dropping the watch stops the task.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheEvent, Cacheable, QueryState};
use crate::client::QueryClient;
use crate::query::Query;

pub struct QueryWatch<T> {
    state: watch::Receiver<QueryState<T>>,
    cancel: CancellationToken,
}

impl<T: Cacheable> QueryWatch<T> {
    /// The most recent state.
    pub fn current(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Wait for the next state change. `None` once the watch has stopped.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.state.changed().await.ok()?;
        let state = self.state.borrow_and_update();
        Some((*state).clone())
    }

    /// Wait until the state satisfies `predicate` and return it.
    pub async fn wait_for(
        &mut self,
        predicate: impl Fn(&QueryState<T>) -> bool,
    ) -> Option<QueryState<T>> {
        let state = self.state.wait_for(|s| predicate(s)).await.ok()?;
        Some((*state).clone())
    }
}

impl<T> QueryWatch<T> {
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl<T> Drop for QueryWatch<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl QueryClient {
    /// Start keeping `query` current until the returned watch is dropped.
    pub fn watch<T: Cacheable>(self: &Arc<Self>, query: Query<T>) -> QueryWatch<T> {
        let (tx, rx) = watch::channel(QueryState::Loading);
        let cancel = CancellationToken::new();
        tokio::spawn(run_watch(Arc::clone(self), query, tx, cancel.clone()));
        QueryWatch { state: rx, cancel }
    }
}

async fn run_watch<T: Cacheable>(
    client: Arc<QueryClient>,
    query: Query<T>,
    tx: watch::Sender<QueryState<T>>,
    cancel: CancellationToken,
) {
    let key = query.key().clone();
    let mut events = client.cache().subscribe();
    let mut ticker = query.policy().poll_every.map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    client.cache().add_watcher(&key).await;
    tracing::debug!(%key, poll = ?query.policy().poll_every, "Query watch started");
    publish(&tx, client.fetch(&query).await);

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = next_tick(&mut ticker) => client.refetch(&query).await,
            event = events.recv() => match event {
                Ok(CacheEvent::Updated(updated)) if updated == key => client.peek(&query).await,
                Ok(CacheEvent::Invalidated(entity)) if entity == key.entity() => {
                    client.refetch(&query).await
                }
                Ok(CacheEvent::Purged | CacheEvent::TransportChanged) => client.fetch(&query).await,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%key, skipped, "Query watch lagged, refetching");
                    client.refetch(&query).await
                }
                Err(RecvError::Closed) => break,
            },
        };
        publish(&tx, next);
        // Nobody is looking any more.
        if tx.is_closed() {
            break;
        }
    }

    client.cache().remove_watcher(&key).await;
    tracing::debug!(%key, "Query watch stopped");
}

fn publish<T: Cacheable>(tx: &watch::Sender<QueryState<T>>, next: QueryState<T>) {
    tx.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
