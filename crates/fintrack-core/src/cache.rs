//! Single-slot cache for the last fetched table
//!
//! Data stays as fetched until `refresh` or `invalidate` is called; there is
//! no expiry. The cache is shared by reference across tasks: fetches are
//! serialised by an async gate, while readers only take a short lock on the
//! slot and never wait for a fetch in progress.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use crate::error::CoreResult;
use crate::models::{CacheStatus, Snapshot};

#[derive(Debug, Default)]
pub struct TableCache {
    slot: RwLock<Option<Arc<Snapshot>>>,
    fetch_gate: Mutex<()>,
    fetching: AtomicBool,
}

/// Clears the `fetching` flag however the fetch ends
struct FetchingGuard<'a>(&'a AtomicBool);

impl<'a> FetchingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for FetchingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached snapshot, if any, without fetching
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// True while a fetch is running
    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> CacheStatus {
        let mut status = match self.current() {
            Some(snapshot) => CacheStatus::of(&snapshot),
            None => CacheStatus::empty(),
        };
        status.fetching = self.is_fetching();
        status
    }

    fn store(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        log::info!(
            "Cached table refreshed: {} rows, {} skipped",
            snapshot.table.len(),
            snapshot.skipped.len()
        );
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Return the cached snapshot, running `fetch` only when the slot is empty.
    ///
    /// Concurrent callers on an empty slot wait for a single fetch.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> CoreResult<Arc<Snapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CoreResult<Snapshot>>,
    {
        if let Some(snapshot) = self.current() {
            log::debug!("Using cached table ({} rows)", snapshot.table.len());
            return Ok(snapshot);
        }

        let _gate = self.fetch_gate.lock().await;
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let _fetching = FetchingGuard::start(&self.fetching);
        let snapshot = fetch().await?;
        Ok(self.store(snapshot))
    }

    /// Fetch unconditionally and replace the slot.
    ///
    /// On failure the previous snapshot is kept.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> CoreResult<Arc<Snapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CoreResult<Snapshot>>,
    {
        let _gate = self.fetch_gate.lock().await;
        let _fetching = FetchingGuard::start(&self.fetching);
        let snapshot = fetch().await?;
        Ok(self.store(snapshot))
    }

    /// Drop the cached snapshot; the next `get_or_fetch` fetches again
    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
