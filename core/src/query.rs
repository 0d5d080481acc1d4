//! Request-state cache keyed by `QueryKey`.
//!
//! # Design
//! Each key maps to one `QueryState`: status, last good data, last error and
//! when the data arrived. Fetches are tracked by `FetchTicket`; only the
//! ticket most recently issued for a key may resolve it, so a superseded
//! response is dropped even if the host failed to abort it. The cache never
//! performs I/O and takes `now` as an argument, which keeps it deterministic
//! under test.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::ApiError;
use crate::types::StudentId;

/// Address of one cached async result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// One page of the student list.
    Students { page: u32 },
    /// A single student record.
    Student { id: StudentId },
}

impl QueryKey {
    pub fn students(page: u32) -> Self {
        QueryKey::Students { page }
    }

    pub fn student(id: impl Into<StudentId>) -> Self {
        QueryKey::Student { id: id.into() }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, QueryKey::Students { .. })
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Students { page } => write!(f, "students[{page}]"),
            QueryKey::Student { id } => write!(f, "student[{id}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Loading,
    Success,
    Error,
}

/// Observable state of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub data: Option<V>,
    pub error: Option<ApiError>,
    pub updated_at: Option<Instant>,
    pub invalidated: bool,
}

impl<V> QueryState<V> {
    fn loading() -> Self {
        Self {
            status: QueryStatus::Loading,
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

/// Handle for one issued fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: QueryKey,
    pub generation: u64,
}

/// Result of `QueryCache::begin_fetch`.
#[derive(Debug)]
pub struct BeginFetch {
    pub ticket: FetchTicket,
    /// The fetch this one replaces; the host should abort it.
    pub superseded: Option<FetchTicket>,
}

#[derive(Debug)]
struct InFlight<V> {
    generation: u64,
    /// State to restore if the fetch is cancelled; `None` if the key was new.
    previous: Option<QueryState<V>>,
}

#[derive(Debug)]
struct Entry<V> {
    state: QueryState<V>,
    in_flight: Option<InFlight<V>>,
}

#[derive(Debug)]
pub struct QueryCache<V> {
    entries: HashMap<QueryKey, Entry<V>>,
    next_generation: u64,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_generation: 1,
        }
    }
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&QueryState<V>> {
        self.entries.get(key).map(|e| &e.state)
    }

    pub fn data(&self, key: &QueryKey) -> Option<&V> {
        self.get(key).and_then(|s| s.data.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the key holds successful data younger than `stale_time` that
    /// has not been invalidated.
    pub fn is_fresh(&self, key: &QueryKey, stale_time: Duration, now: Instant) -> bool {
        let Some(state) = self.get(key) else {
            return false;
        };
        match (state.status, state.updated_at) {
            (QueryStatus::Success, Some(at)) if !state.invalidated => {
                now.saturating_duration_since(at) < stale_time
            }
            _ => false,
        }
    }

    pub fn in_flight(&self, key: &QueryKey) -> Option<FetchTicket> {
        self.entries.get(key).and_then(|e| {
            e.in_flight.as_ref().map(|f| FetchTicket {
                key: key.clone(),
                generation: f.generation,
            })
        })
    }

    /// Whether a read of `key` should issue a request.
    pub fn needs_fetch(&self, key: &QueryKey, stale_time: Duration, now: Instant) -> bool {
        self.in_flight(key).is_none() && !self.is_fresh(key, stale_time, now)
    }

    /// Move `key` to loading and issue a ticket. Data from a previous success
    /// stays visible while loading.
    pub fn begin_fetch(&mut self, key: QueryKey) -> BeginFetch {
        let generation = self.next_generation;
        self.next_generation += 1;

        let (superseded, previous) = match self.entries.get_mut(&key) {
            Some(entry) => match entry.in_flight.take() {
                Some(old) => (
                    Some(FetchTicket {
                        key: key.clone(),
                        generation: old.generation,
                    }),
                    old.previous,
                ),
                None => (None, Some(entry.state.clone())),
            },
            None => (None, None),
        };

        let entry = self.entries.entry(key.clone()).or_insert_with(|| Entry {
            state: QueryState::loading(),
            in_flight: None,
        });
        entry.state.status = QueryStatus::Loading;
        entry.in_flight = Some(InFlight { generation, previous });

        if let Some(old) = &superseded {
            debug!(%key, superseded = old.generation, generation, "fetch superseded");
        } else {
            debug!(%key, generation, "fetch started");
        }

        BeginFetch {
            ticket: FetchTicket { key, generation },
            superseded,
        }
    }

    /// Apply the outcome of a fetch. Returns `false` and leaves the cache
    /// untouched if the ticket is no longer current. A `Cancelled` outcome
    /// behaves like `cancel`.
    pub fn resolve(&mut self, ticket: &FetchTicket, outcome: Result<V, ApiError>, now: Instant) -> bool {
        let current = self
            .entries
            .get(&ticket.key)
            .and_then(|e| e.in_flight.as_ref())
            .is_some_and(|f| f.generation == ticket.generation);
        if !current {
            debug!(key = %ticket.key, generation = ticket.generation, "stale fetch result dropped");
            return false;
        }

        if matches!(outcome, Err(ApiError::Cancelled)) {
            self.cancel(&ticket.key);
            return true;
        }

        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return false;
        };
        entry.in_flight = None;
        match outcome {
            Ok(data) => {
                entry.state = QueryState {
                    status: QueryStatus::Success,
                    data: Some(data),
                    error: None,
                    updated_at: Some(now),
                    invalidated: false,
                };
                debug!(key = %ticket.key, "fetch succeeded");
            }
            Err(err) => {
                debug!(key = %ticket.key, error = %err, "fetch failed");
                entry.state.status = QueryStatus::Error;
                entry.state.error = Some(err);
            }
        }
        true
    }

    /// Abort the in-flight fetch of `key`, restoring the state it replaced.
    /// A key that had never resolved is dropped entirely.
    pub fn cancel(&mut self, key: &QueryKey) -> Option<FetchTicket> {
        let entry = self.entries.get_mut(key)?;
        let in_flight = entry.in_flight.take()?;
        let ticket = FetchTicket {
            key: key.clone(),
            generation: in_flight.generation,
        };
        match in_flight.previous {
            Some(previous) => entry.state = previous,
            None => {
                self.entries.remove(key);
            }
        }
        debug!(%key, generation = ticket.generation, "fetch cancelled");
        Some(ticket)
    }

    /// Mark one key stale so the next read re-fetches it. Returns whether the
    /// key was cached.
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.state.invalidated = true;
                debug!(%key, "invalidated");
                true
            }
            None => false,
        }
    }

    /// Invalidate every key matching `pred`; returns the keys touched.
    pub fn invalidate_where(&mut self, pred: impl Fn(&QueryKey) -> bool) -> Vec<QueryKey> {
        let keys: Vec<QueryKey> = self.entries.keys().filter(|k| pred(k)).cloned().collect();
        for key in &keys {
            self.invalidate(key);
        }
        keys
    }

    /// Store data directly, as if a fetch had just succeeded. Any in-flight
    /// fetch for the key is left running.
    pub fn set_data(&mut self, key: QueryKey, data: V, now: Instant) {
        let entry = self.entries.entry(key).or_insert_with(|| Entry {
            state: QueryState::loading(),
            in_flight: None,
        });
        entry.state = QueryState {
            status: QueryStatus::Success,
            data: Some(data),
            error: None,
            updated_at: Some(now),
            invalidated: false,
        };
    }

    pub fn remove(&mut self, key: &QueryKey) -> Option<QueryState<V>> {
        self.entries.remove(key).map(|e| e.state)
    }
}
