// src/build/coalesce.rs

//! Per-recipe build coalescing (singleflight pattern)
//!
//! When several requests need the same stale recipe at once, only the first
//! one (the leader) builds. The others subscribe to the leader's broadcast
//! channel and receive its outcome.
//!
//! The in-flight entry is claimed through the map's entry API, so two tasks
//! can never both become leader. The leader removes its entry before
//! broadcasting: a request arriving afterwards starts a new round, which
//! finds the fresh artifact on its staleness re-check. If the leader is
//! cancelled, its guard removes the entry and the waiters retry.

use crate::error::{Error, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Outcome shared with waiting tasks
#[derive(Debug, Clone)]
enum Shared<T> {
    Success(T),
    NotFound,
    BuildFailed,
    Failed(String),
}

impl<T: Clone> Shared<T> {
    fn from_result(result: &Result<T>) -> Self {
        match result {
            Ok(value) => Shared::Success(value.clone()),
            Err(Error::RecipeNotFound(_)) => Shared::NotFound,
            Err(Error::BuildFailed(_)) => Shared::BuildFailed,
            Err(e) => Shared::Failed(e.to_string()),
        }
    }

    fn into_result(self, id: i64) -> Result<T> {
        match self {
            Shared::Success(value) => Ok(value),
            Shared::NotFound => Err(Error::RecipeNotFound(id)),
            Shared::BuildFailed => Err(Error::BuildFailed(id)),
            Shared::Failed(msg) => Err(Error::TaskError(msg)),
        }
    }
}

enum Role<T> {
    Leader(broadcast::Sender<Shared<T>>),
    Waiter(broadcast::Receiver<Shared<T>>),
}

/// Removes the in-flight entry when the leader finishes or is dropped
struct InflightGuard<'a, T> {
    inflight: &'a DashMap<i64, broadcast::Sender<Shared<T>>>,
    id: i64,
}

impl<T> Drop for InflightGuard<'_, T> {
    fn drop(&mut self) {
        self.inflight.remove(&self.id);
    }
}

/// Single-flight map keyed by recipe id
pub struct BuildCoalescer<T> {
    inflight: DashMap<i64, broadcast::Sender<Shared<T>>>,
    /// Requests that were served by another task's build
    coalesced_count: AtomicU64,
}

impl<T: Clone> BuildCoalescer<T> {
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
            coalesced_count: AtomicU64::new(0),
        }
    }

    /// Run `work` for `id` unless a run for the same id is in flight, in
    /// which case wait for that run's outcome instead
    pub async fn coalesce<F, Fut>(&self, id: i64, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            let role = match self.inflight.entry(id) {
                Entry::Occupied(entry) => Role::Waiter(entry.get().subscribe()),
                Entry::Vacant(entry) => {
                    let (tx, _rx) = broadcast::channel(1);
                    entry.insert(tx.clone());
                    Role::Leader(tx)
                }
            };

            match role {
                Role::Waiter(mut rx) => {
                    debug!("Waiting for in-flight build of recipe {}", id);
                    self.coalesced_count.fetch_add(1, Ordering::Relaxed);
                    match rx.recv().await {
                        Ok(shared) => return shared.into_result(id),
                        Err(_) => {
                            debug!("In-flight build of recipe {} went away, retrying", id);
                            continue;
                        }
                    }
                }
                Role::Leader(tx) => {
                    let guard = InflightGuard {
                        inflight: &self.inflight,
                        id,
                    };
                    let result = work().await;
                    drop(guard);

                    // No receivers is fine
                    let _ = tx.send(Shared::from_result(&result));
                    return result;
                }
            }
        }
    }

    pub fn coalesced_count(&self) -> u64 {
        self.coalesced_count.load(Ordering::Relaxed)
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

impl<T: Clone> Default for BuildCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}
