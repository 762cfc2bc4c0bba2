//! Keyed entry store with TTL, invalidation and in-flight fetch coalescing
//!
//! Shared by [`EntityCache`](super::EntityCache) and [`ListCache`](super::ListCache).
//! The mutex is only held for bookkeeping and never across an await, so the
//! "check validity, mark pending" step completes before the first suspension
//! point and a second caller always sees the pending fetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::cache::{CacheEntry, CacheError, CachePolicy, CacheRead, StaleFallback};
use crate::domain::DomainError;

pub(crate) type FetchFuture<V> = BoxFuture<'static, Result<V, CacheError>>;
type SharedFetch<V> = Shared<FetchFuture<V>>;

/// Normalisation applied to every stored value (e.g. the active list ordering)
pub(crate) type Prepare<V> = Box<dyn Fn(&mut V) + Send>;

struct Pending<V> {
    ticket: u64,
    fetch: SharedFetch<V>,
}

struct Slot<V> {
    entry: Option<CacheEntry<V>>,
    pending: Option<Pending<V>>,
    serve_stale_until: Option<StaleWindow>,
}

/// Period after a failed refresh during which the stale value is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaleWindow {
    Until(Instant),
    /// `retry_after` reaches past the clock's range
    Unbounded,
}

impl StaleWindow {
    fn starting(now: Instant, retry_after: Duration) -> Self {
        now.checked_add(retry_after)
            .map_or(Self::Unbounded, Self::Until)
    }

    fn covers(&self, now: Instant) -> bool {
        match self {
            Self::Until(until) => now < *until,
            Self::Unbounded => true,
        }
    }
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            entry: None,
            pending: None,
            serve_stale_until: None,
        }
    }
}

impl<V> Slot<V> {
    fn is_vacant(&self) -> bool {
        self.entry.is_none() && self.pending.is_none()
    }

    /// Expires the entry and detaches any in-flight fetch
    fn invalidate(&mut self) {
        if let Some(entry) = &mut self.entry {
            entry.invalidate();
        }
        self.pending = None;
        self.serve_stale_until = None;
    }
}

struct State<V> {
    slots: HashMap<String, Slot<V>>,
    policy: CachePolicy,
    next_ticket: u64,
    prepare: Option<Prepare<V>>,
}

pub(crate) struct KeyedCache<V> {
    name: Arc<str>,
    state: Arc<Mutex<State<V>>>,
}

impl<V> std::fmt::Debug for KeyedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("KeyedCache")
            .field("name", &self.name)
            .field("slots", &state.slots.len())
            .field("policy", &state.policy)
            .finish()
    }
}

fn lock<V>(state: &Mutex<State<V>>) -> MutexGuard<'_, State<V>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<V> KeyedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(name: impl Into<String>, policy: CachePolicy) -> Self {
        let name: String = name.into();

        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(State {
                slots: HashMap::new(),
                policy,
                next_ticket: 0,
                prepare: None,
            })),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Serves a valid entry, joins a pending fetch, or starts `fetch`
    pub(crate) async fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> FetchFuture<V>,
    {
        let shared = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            let now = Instant::now();
            let slot = state.slots.entry(key.to_string()).or_default();

            if let Some(entry) = &slot.entry {
                if entry.is_valid(now) {
                    counter!("cache_hits_total", "cache" => self.name.to_string()).increment(1);
                    debug!(cache = %self.name, key = %key, "Cache hit");
                    return Ok(entry.value().clone());
                }

                if slot.serve_stale_until.is_some_and(|window| window.covers(now)) {
                    counter!("cache_stale_hits_total", "cache" => self.name.to_string())
                        .increment(1);
                    debug!(cache = %self.name, key = %key, "Serving stale value after failed refresh");
                    return Ok(entry.value().clone());
                }
            }

            match &slot.pending {
                Some(pending) => {
                    counter!("cache_coalesced_total", "cache" => self.name.to_string())
                        .increment(1);
                    debug!(cache = %self.name, key = %key, "Joining in-flight fetch");
                    pending.fetch.clone()
                }
                None => {
                    counter!("cache_misses_total", "cache" => self.name.to_string())
                        .increment(1);
                    debug!(cache = %self.name, key = %key, "Cache miss, fetching");

                    state.next_ticket += 1;
                    let ticket = state.next_ticket;
                    let shared = self.spawn_fetch(key, ticket, fetch());
                    slot.pending = Some(Pending {
                        ticket,
                        fetch: shared.clone(),
                    });
                    shared
                }
            }
        };

        shared.await
    }

    /// Runs the fetch on its own task so abandoned callers do not cancel it
    fn spawn_fetch(&self, key: &str, ticket: u64, fetch: FetchFuture<V>) -> SharedFetch<V> {
        let name = Arc::clone(&self.name);
        let state = Arc::clone(&self.state);
        let task_key = key.to_string();

        let task = tokio::spawn(async move {
            let mut result = fetch.await;
            complete(&name, &state, &task_key, ticket, &mut result);
            result
        });

        let name = Arc::clone(&self.name);
        let state = Arc::clone(&self.state);
        let key = key.to_string();

        async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    let error = CacheError::fetch(
                        key.clone(),
                        DomainError::internal(format!("Fetch task failed: {}", join_error)),
                    );
                    complete(&name, &state, &key, ticket, &mut Err(error.clone()));
                    Err(error)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Marks the entry stale and detaches any in-flight fetch for it
    pub(crate) fn invalidate(&self, key: &str) {
        let mut guard = lock(&self.state);

        if let Some(slot) = guard.slots.get_mut(key) {
            slot.invalidate();

            if slot.is_vacant() {
                guard.slots.remove(key);
            }
        }

        counter!("cache_invalidations_total", "cache" => self.name.to_string()).increment(1);
        debug!(cache = %self.name, key = %key, "Invalidated");
    }

    pub(crate) fn invalidate_all(&self) {
        let mut guard = lock(&self.state);

        for slot in guard.slots.values_mut() {
            slot.invalidate();
        }
        guard.slots.retain(|_, slot| !slot.is_vacant());

        counter!("cache_invalidations_total", "cache" => self.name.to_string()).increment(1);
        debug!(cache = %self.name, "Invalidated all entries");
    }

    /// Edits a populated value in place, then marks it stale.
    ///
    /// Returns whether an entry was present.
    pub(crate) fn amend<F>(&self, key: &str, edit: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut guard = lock(&self.state);
        let state = &mut *guard;

        let Some(slot) = state.slots.get_mut(key) else {
            return false;
        };

        let amended = match &mut slot.entry {
            Some(entry) => {
                edit(entry.value_mut());
                if let Some(prepare) = &state.prepare {
                    prepare(entry.value_mut());
                }
                true
            }
            None => false,
        };

        slot.invalidate();
        if slot.is_vacant() {
            state.slots.remove(key);
        }

        amended
    }

    /// Installs a normalisation and applies it to every stored value
    pub(crate) fn set_prepare(&self, prepare: Prepare<V>) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;

        for entry in state.slots.values_mut().filter_map(|slot| slot.entry.as_mut()) {
            prepare(entry.value_mut());
        }

        state.prepare = Some(prepare);
    }

    /// Reads the stored value without fetching, valid or not
    pub(crate) fn peek(&self, key: &str) -> Option<CacheRead<V>> {
        let guard = lock(&self.state);
        let now = Instant::now();

        guard
            .slots
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| CacheRead {
                value: entry.value().clone(),
                age: now.saturating_duration_since(entry.fetched_at()),
                stale: !entry.is_valid(now),
            })
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        lock(&self.state)
            .slots
            .get(key)
            .is_some_and(|slot| slot.entry.is_some())
    }

    pub(crate) fn is_pending(&self, key: &str) -> bool {
        lock(&self.state)
            .slots
            .get(key)
            .is_some_and(|slot| slot.pending.is_some())
    }

    /// Number of populated entries
    pub(crate) fn len(&self) -> usize {
        lock(&self.state)
            .slots
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    pub(crate) fn policy(&self) -> CachePolicy {
        lock(&self.state).policy
    }

    /// Applies to entries populated from now on
    pub(crate) fn set_ttl(&self, ttl: Duration) {
        lock(&self.state).policy.ttl = ttl;
        debug!(cache = %self.name, ttl_secs = ttl.as_secs(), "TTL updated");
    }

    pub(crate) fn set_stale_fallback(&self, fallback: StaleFallback) {
        lock(&self.state).policy.stale_fallback = fallback;
    }
}

/// Stores the outcome of fetch `ticket` unless it was superseded by an invalidation
fn complete<V>(
    name: &str,
    state: &Mutex<State<V>>,
    key: &str,
    ticket: u64,
    result: &mut Result<V, CacheError>,
) where
    V: Clone,
{
    let mut guard = lock(state);
    let state = &mut *guard;
    let now = Instant::now();

    let Some(slot) = state.slots.get_mut(key) else {
        debug!(cache = %name, key = %key, "Discarding superseded fetch");
        return;
    };

    if slot.pending.as_ref().map(|pending| pending.ticket) != Some(ticket) {
        debug!(cache = %name, key = %key, "Discarding superseded fetch");
        return;
    }

    slot.pending = None;

    match result {
        Ok(value) => {
            if let Some(prepare) = &state.prepare {
                prepare(value);
            }

            let ttl = state.policy.ttl;
            match &mut slot.entry {
                Some(entry) => entry.refresh(value.clone(), now, ttl),
                None => slot.entry = Some(CacheEntry::new(value.clone(), now, ttl)),
            }
            slot.serve_stale_until = None;
        }
        Err(error) => {
            counter!("cache_fetch_errors_total", "cache" => name.to_string()).increment(1);
            warn!(cache = %name, key = %key, error = %error, "Fetch failed");

            if error.is_fetch() && slot.entry.is_some() {
                if let Some(retry_after) = state.policy.stale_fallback.retry_after() {
                    slot.serve_stale_until = Some(StaleWindow::starting(now, retry_after));
                }
            }
        }
    }

    if slot.is_vacant() {
        state.slots.remove(key);
    }
}
