//! Single-flight snapshot cache.
//!
//! The fetch runs while the slot's async mutex is held, so concurrent first
//! users wait on the one in-flight fetch and then read its result instead of
//! issuing their own. Refreshes are keyed by a ticket taken when the caller
//! starts: a refresh that completes after the ticket was taken is shared
//! instead of repeated, even if the caller only reached the lock after it.

use crate::executor::error::Result;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A cached value together with the generation it was fetched in.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub value: Arc<T>,
    pub generation: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            generation: self.generation,
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<Arc<T>>,
    generation: u64,
}

/// Lazily fetched value shared by every user of one orchestrator.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    slot: Mutex<Slot<T>>,
    /// Completed refreshes. Written under the slot lock, read without it.
    refreshes: AtomicU64,
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                generation: 0,
            }),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Ticket for a later [`refresh`](Self::refresh). Take it before reading
    /// the snapshot that may turn out stale.
    pub fn refresh_ticket(&self) -> u64 {
        self.refreshes.load(Ordering::Acquire)
    }

    /// Returns the cached value, fetching it first if the cache is empty.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Snapshot<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(value) = &slot.value {
            return Ok(Snapshot {
                value: Arc::clone(value),
                generation: slot.generation,
            });
        }
        Self::store(&mut slot, fetch().await?)
    }

    /// Refetches unless a refresh completed after `ticket` was taken.
    pub async fn refresh<F, Fut>(&self, ticket: u64, fetch: F) -> Result<Snapshot<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut slot = self.slot.lock().await;
        if self.refreshes.load(Ordering::Acquire) > ticket {
            if let Some(value) = &slot.value {
                return Ok(Snapshot {
                    value: Arc::clone(value),
                    generation: slot.generation,
                });
            }
        }
        let snapshot = Self::store(&mut slot, fetch().await?)?;
        self.refreshes.fetch_add(1, Ordering::Release);
        Ok(snapshot)
    }

    /// Drops the cached value; the next access fetches again.
    pub async fn invalidate(&self) {
        self.slot.lock().await.value = None;
    }

    /// Number of fetches that completed so far.
    pub async fn generation(&self) -> u64 {
        self.slot.lock().await.generation
    }

    fn store(slot: &mut Slot<T>, value: T) -> Result<Snapshot<T>> {
        let value = Arc::new(value);
        slot.value = Some(Arc::clone(&value));
        slot.generation += 1;
        Ok(Snapshot {
            value,
            generation: slot.generation,
        })
    }
}
