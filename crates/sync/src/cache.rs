//! Process-wide query cache.
//!
//! Each [`QueryKey`] owns one slot holding the last value, the last error
//! and the ticket of the most recent request. A completion is stored only
//! if its ticket is still the slot's current ticket, so a late response to
//! an earlier request can never overwrite a newer one. Invalidation, purge
//! and transport changes retire outstanding tickets; the caller is told so
//! it can ask again.
//!
//! Keys nobody watches are dropped once idle for long enough.
//!
//! Every change is announced on a broadcast channel of [`CacheEvent`]s,
//! which live views use to re-read or refetch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use iems_core::fee::Fee;
use iems_core::homework::HomeworkEntry;
use iems_core::message::Message;
use iems_core::profile::Profile;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

use crate::key::{Entity, QueryKey};

/// Default buffer capacity for the event channel.
const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// QueryState
// ---------------------------------------------------------------------------

/// What a view sees for one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// No transport yet, or a required parameter is blank. No call was made.
    Disabled,
    Loading,
    Ready(T),
    /// The last fetch failed with this message.
    Failed(String),
}

impl<T> QueryState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cached values
// ---------------------------------------------------------------------------

/// Every value shape the remote reads produce.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Profile(Option<Profile>),
    Profiles(Vec<Profile>),
    Attendance(bool),
    Homework(Option<HomeworkEntry>),
    Fee(Option<Fee>),
    Messages(Vec<Message>),
}

/// A value that can be stored in and read back from the cache.
pub trait Cacheable: Clone + PartialEq + Send + Sync + 'static {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: &CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Option<Profile>, Profile);
cacheable!(Vec<Profile>, Profiles);
cacheable!(bool, Attendance);
cacheable!(Option<HomeworkEntry>, Homework);
cacheable!(Option<Fee>, Fee);
cacheable!(Vec<Message>, Messages);

// ---------------------------------------------------------------------------
// CacheEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// A fetch for this key completed and was stored.
    Updated(QueryKey),
    /// Every key of this family is stale and should be refetched.
    Invalidated(Entity),
    /// The whole cache was cleared.
    Purged,
    /// A remote port was attached or detached.
    TransportChanged,
}

// ---------------------------------------------------------------------------
// QueryCache
// ---------------------------------------------------------------------------

/// What became of a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Stored,
    /// A newer request for the same key owns the slot.
    Superseded,
    /// Invalidation, purge or a transport change retired the request. Its
    /// outcome may describe data that no longer holds, so ask again.
    Retired,
}

#[derive(Debug)]
struct Slot {
    /// Latest request issued for the key.
    ticket: u64,
    /// Requests at or below this ticket are retired.
    retired: u64,
    value: Option<CachedValue>,
    error: Option<String>,
    stale: bool,
    touched: Instant,
}

impl Slot {
    fn new() -> Self {
        Self {
            ticket: 0,
            retired: 0,
            value: None,
            error: None,
            stale: false,
            touched: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    entries: HashMap<QueryKey, Slot>,
    /// Live watch count per key. Survives purges.
    watchers: HashMap<QueryKey, usize>,
    /// Every request at or below this ticket is retired, whatever its key.
    retired: u64,
}

pub struct QueryCache {
    slots: RwLock<Slots>,
    next_ticket: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self {
            slots: RwLock::new(Slots::default()),
            next_ticket: AtomicU64::new(0),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: CacheEvent) {
        // Zero receivers is fine.
        let _ = self.events.send(event);
    }

    /// Tickets are only issued under the slots write lock.
    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn last_ticket(&self) -> u64 {
        self.next_ticket.load(Ordering::Relaxed)
    }

    /// Register a new request for `key` and return its ticket. Any earlier
    /// request for the same key is superseded.
    pub async fn begin(&self, key: &QueryKey) -> u64 {
        let mut slots = self.slots.write().await;
        let ticket = self.issue_ticket();
        let slot = slots.entries.entry(key.clone()).or_insert_with(Slot::new);
        slot.ticket = ticket;
        slot.touched = Instant::now();
        ticket
    }

    /// Store the outcome of the request holding `ticket`.
    ///
    /// Only [`Completion::Stored`] touches the slot. A failure keeps the
    /// previous value so the next success can replace it.
    pub async fn complete(
        &self,
        key: &QueryKey,
        ticket: u64,
        outcome: Result<CachedValue, String>,
    ) -> Completion {
        {
            let mut slots = self.slots.write().await;
            let floor = slots.retired;
            let Some(slot) = slots.entries.get_mut(key) else {
                tracing::debug!(%key, ticket, "Discarding response for dropped key");
                return Completion::Retired;
            };
            if ticket <= floor.max(slot.retired) {
                tracing::debug!(%key, ticket, "Discarding retired response");
                return Completion::Retired;
            }
            if slot.ticket != ticket {
                tracing::debug!(
                    %key,
                    ticket,
                    current = slot.ticket,
                    "Discarding superseded response",
                );
                return Completion::Superseded;
            }
            match outcome {
                Ok(value) => {
                    slot.value = Some(value);
                    slot.error = None;
                    slot.stale = false;
                }
                Err(message) => slot.error = Some(message),
            }
            slot.touched = Instant::now();
        }
        self.publish(CacheEvent::Updated(key.clone()));
        Completion::Stored
    }

    /// `true` when the key holds a value that needs no refetch.
    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        self.slots
            .read()
            .await
            .entries
            .get(key)
            .is_some_and(|slot| slot.value.is_some() && slot.error.is_none() && !slot.stale)
    }

    /// `true` when the last fetch of `key` failed and nothing has
    /// invalidated it since.
    pub async fn has_failed(&self, key: &QueryKey) -> bool {
        self.slots
            .read()
            .await
            .entries
            .get(key)
            .is_some_and(|slot| slot.error.is_some() && !slot.stale)
    }

    pub async fn value(&self, key: &QueryKey) -> Option<CachedValue> {
        self.slots
            .read()
            .await
            .entries
            .get(key)
            .and_then(|slot| slot.value.clone())
    }

    /// The view state of `key` as currently stored. A key never fetched
    /// reads as [`QueryState::Loading`].
    pub async fn state<T: Cacheable>(&self, key: &QueryKey) -> QueryState<T> {
        let slots = self.slots.read().await;
        let Some(slot) = slots.entries.get(key) else {
            return QueryState::Loading;
        };
        if let Some(message) = &slot.error {
            return QueryState::Failed(message.clone());
        }
        slot.value
            .as_ref()
            .and_then(T::from_cached)
            .map_or(QueryState::Loading, QueryState::Ready)
    }

    /// Mark every key of `entity` stale and retire their outstanding
    /// requests. Returns how many keys were affected.
    pub async fn invalidate(&self, entity: Entity) -> usize {
        let affected = {
            let mut slots = self.slots.write().await;
            let mut affected = 0;
            for (key, slot) in slots.entries.iter_mut() {
                if key.entity() == entity {
                    slot.stale = true;
                    slot.retired = slot.ticket;
                    affected += 1;
                }
            }
            affected
        };
        tracing::debug!(%entity, affected, "Invalidated cache family");
        self.publish(CacheEvent::Invalidated(entity));
        affected
    }

    /// Retire every outstanding request without touching stored values.
    pub(crate) async fn retire_in_flight(&self) {
        let mut slots = self.slots.write().await;
        slots.retired = self.last_ticket();
    }

    /// Drop every slot. Responses still in flight are discarded on arrival.
    pub async fn purge(&self) {
        {
            let mut slots = self.slots.write().await;
            slots.entries.clear();
            slots.retired = self.last_ticket();
        }
        tracing::debug!("Purged query cache");
        self.publish(CacheEvent::Purged);
    }

    /// Count a live view of `key`. Watched keys are never evicted.
    pub(crate) async fn add_watcher(&self, key: &QueryKey) {
        *self
            .slots
            .write()
            .await
            .watchers
            .entry(key.clone())
            .or_default() += 1;
    }

    pub(crate) async fn remove_watcher(&self, key: &QueryKey) {
        let mut slots = self.slots.write().await;
        if let Some(count) = slots.watchers.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                slots.watchers.remove(key);
            }
        }
        if let Some(slot) = slots.entries.get_mut(key) {
            slot.touched = Instant::now();
        }
    }

    /// Drop unwatched keys not fetched for at least `idle`. Returns how
    /// many were dropped.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let mut slots = self.slots.write().await;
        let now = Instant::now();
        let Slots {
            entries, watchers, ..
        } = &mut *slots;
        let before = entries.len();
        entries.retain(|key, slot| {
            watchers.contains_key(key) || now.duration_since(slot.touched) < idle
        });
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle cache entries");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
