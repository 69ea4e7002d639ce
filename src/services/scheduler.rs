// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Periodic refresh of the cached snapshot.
//!
//! Consumers only ever see the last good snapshot (or `None` before the
//! first success). A failed cycle is logged and leaves the cache alone.

use crate::error::AppError;
use crate::models::StatSnapshot;
use crate::services::StatsFetcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default refresh period (15 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Latest snapshot as seen by consumers.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<StatSnapshot>>>;

/// Result of one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A new snapshot was published.
    Updated,
    /// The fetch failed; the previous snapshot (if any) is still current.
    Retained(AppError),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated)
    }
}

pub struct RefreshScheduler {
    fetcher: StatsFetcher,
    cust_id: u64,
    interval: Duration,
    cache: watch::Sender<Option<Arc<StatSnapshot>>>,
    /// Held for the duration of a cycle so cycles never overlap.
    cycle_lock: Mutex<()>,
}

impl RefreshScheduler {
    pub fn new(fetcher: StatsFetcher, cust_id: u64, interval: Duration) -> Self {
        let (cache, _) = watch::channel(None);
        Self {
            fetcher,
            cust_id,
            interval,
            cache,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn cust_id(&self) -> u64 {
        self.cust_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last good snapshot, if any cycle has succeeded yet.
    pub fn latest(&self) -> Option<Arc<StatSnapshot>> {
        self.cache.borrow().clone()
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.cache.subscribe()
    }

    /// Run one refresh cycle now.
    ///
    /// If a cycle is already running this waits for it and then runs again.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let _guard = self.cycle_lock.lock().await;

        match self.fetcher.fetch_snapshot(self.cust_id).await {
            Ok(snapshot) => {
                self.cache.send_replace(Some(Arc::new(snapshot)));
                RefreshOutcome::Updated
            }
            Err(e) => {
                tracing::warn!(
                    cust_id = self.cust_id,
                    error = %e,
                    has_previous = self.cache.borrow().is_some(),
                    "Error getting member info from iRacing, keeping previous snapshot"
                );
                RefreshOutcome::Retained(e)
            }
        }
    }

    /// Start the refresh loop: one cycle immediately, then one per interval.
    ///
    /// Abort the returned handle to stop polling.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                cust_id = self.cust_id,
                interval_secs = self.interval.as_secs(),
                "Refresh loop started"
            );

            loop {
                ticker.tick().await;
                self.refresh_now().await;
            }
        })
    }
}
