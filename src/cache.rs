//! In-process snapshot caches shared between the refresh loop and the API.
//!
//! Each cache holds an `Arc` to a fully built collection. Publishing swaps
//! the pointer under a write lock held only for the swap, so readers see
//! either the complete old snapshot or the complete new one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{Rate, Score};

/// A swap-on-publish cache of one collection.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    current: RwLock<Arc<Vec<T>>>,
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Vec::new())),
        }
    }
}

impl<T> SnapshotCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Cheap: clones the `Arc`, not the items.
    pub async fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the current snapshot wholesale.
    pub async fn publish(&self, items: Vec<T>) {
        let next = Arc::new(items);
        *self.current.write().await = next;
    }
}

/// Bookkeeping about the refresh loop, served on `/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshStatus {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// All state shared by the refresh loop and request handlers.
#[derive(Debug, Default)]
pub struct Caches {
    pub rates: SnapshotCache<Rate>,
    pub leaders: SnapshotCache<Score>,
    pub status: RwLock<RefreshStatus>,
}

impl Caches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one cycle's results. Rates go first, as they are read first.
    pub async fn publish(&self, rates: Vec<Rate>, leaders: Vec<Score>) {
        self.rates.publish(rates).await;
        self.leaders.publish(leaders).await;

        let mut status = self.status.write().await;
        status.cycles_completed += 1;
        status.last_refresh = Some(Utc::now());
        status.last_error = None;
    }

    /// Record a failed cycle. Published snapshots are left alone.
    pub async fn record_failure(&self, error: &anyhow::Error) {
        let mut status = self.status.write().await;
        status.cycles_failed += 1;
        status.last_error = Some(format!("{error:#}"));
    }

    pub async fn status(&self) -> RefreshStatus {
        self.status.read().await.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
