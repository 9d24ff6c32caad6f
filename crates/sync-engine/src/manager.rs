//! The sync queue manager: drains the durable outbox against the backend.
//!
//! One manager instance is constructed at startup with its repositories,
//! API client and connectivity feed injected, and shared behind an `Arc`.
//! Drains are serialized by a `try_lock`ed mutex; while online a background
//! task drains every [`SYNC_DRAIN_INTERVAL_SECS`] seconds and immediately
//! on the offline-to-online edge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use budgetbook_core::categories::CategoryRepositoryTrait;
use budgetbook_core::errors::Result;
use budgetbook_core::sync::{
    OutboxRepositoryTrait, SyncAction, SyncMetadataRepositoryTrait, MAX_SYNC_ATTEMPTS,
    SYNC_DRAIN_INTERVAL_SECS,
};
use budgetbook_sync_client::ApiRetryClass;

use crate::api::RemoteApi;
use crate::handlers::EntryHandlers;

/// Upper bound of entries one drain pass takes on; the next pass picks up
/// the rest.
const DRAIN_BATCH_LIMIT: i64 = 100;

/// Per-pass bookkeeping, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainSummary {
    pub synced: usize,
    pub retried: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    Completed(DrainSummary),
    /// Another caller holds the drain lock; this pass was skipped.
    AlreadyDraining,
}

pub struct SyncQueueManager {
    outbox: Arc<dyn OutboxRepositoryTrait>,
    metadata: Arc<dyn SyncMetadataRepositoryTrait>,
    handlers: EntryHandlers,
    drain_lock: Mutex<()>,
    connectivity: watch::Receiver<bool>,
    reauth_needed: AtomicBool,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl SyncQueueManager {
    pub fn new(
        outbox: Arc<dyn OutboxRepositoryTrait>,
        metadata: Arc<dyn SyncMetadataRepositoryTrait>,
        categories: Arc<dyn CategoryRepositoryTrait>,
        api: Arc<dyn RemoteApi>,
        connectivity: watch::Receiver<bool>,
    ) -> Self {
        Self {
            outbox,
            metadata,
            handlers: EntryHandlers::new(api, categories),
            drain_lock: Mutex::new(()),
            connectivity,
            reauth_needed: AtomicBool::new(false),
            background: Mutex::new(None),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.connectivity.borrow()
    }

    /// True once any entry failed with an auth-class error since the last
    /// [`Self::acknowledge_reauth`]. The session layer polls this to prompt
    /// for a re-login.
    pub fn reauth_needed(&self) -> bool {
        self.reauth_needed.load(Ordering::SeqCst)
    }

    pub fn acknowledge_reauth(&self) {
        self.reauth_needed.store(false, Ordering::SeqCst);
    }

    /// Fire-and-forget drain after a local mutation. Skipped while offline;
    /// a drain already in progress simply wins the lock race.
    pub fn notify_local_mutation(self: &Arc<Self>) {
        if !self.is_online() {
            return;
        }
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = manager.drain().await {
                debug!("post-mutation drain failed: {}", e);
            }
        });
    }

    /// Run one drain pass over the pending queue, in enqueue order.
    ///
    /// Remote failures are caught per entry: a failing entry gets its retry
    /// count bumped (or is dropped with its payload logged once the budget
    /// is exhausted) and the pass moves on. Local storage failures abort
    /// the pass and surface to the caller.
    pub async fn drain(&self) -> Result<DrainStatus> {
        let Ok(_guard) = self.drain_lock.try_lock() else {
            return Ok(DrainStatus::AlreadyDraining);
        };

        let pending = self.outbox.list_pending(DRAIN_BATCH_LIMIT)?;
        let mut summary = DrainSummary::default();
        let mut done = Vec::new();

        for entry in pending {
            match self.handlers.dispatch(&entry).await {
                Ok(remote_id) => {
                    // A deleted row has no sync metadata left to update.
                    if entry.action != SyncAction::Delete {
                        self.metadata
                            .mark_as_synced(entry.entity, entry.local_id, remote_id)
                            .await?;
                    }
                    done.push(entry.event_id);
                    summary.synced += 1;
                }
                Err(err) => {
                    if err.retry_class() == ApiRetryClass::ReauthRequired {
                        self.reauth_needed.store(true, Ordering::SeqCst);
                    }
                    let attempts = entry.retry_count + 1;
                    if attempts >= MAX_SYNC_ATTEMPTS {
                        log::error!(
                            "dropping sync event {} ({:?} {:?}, local id {}) after {} attempts: {}; payload: {}",
                            entry.event_id,
                            entry.entity,
                            entry.action,
                            entry.local_id,
                            attempts,
                            err,
                            entry.payload
                        );
                        done.push(entry.event_id);
                        summary.dropped += 1;
                    } else {
                        self.outbox
                            .record_failure(entry.event_id.clone(), err.to_string())
                            .await?;
                        summary.retried += 1;
                    }
                }
            }
        }

        if !done.is_empty() {
            self.outbox.delete_events(done).await?;
        }

        debug!(
            "drain pass: {} synced, {} retried, {} dropped",
            summary.synced, summary.retried, summary.dropped
        );
        Ok(DrainStatus::Completed(summary))
    }

    /// Start the connectivity-driven background loop. Idempotent.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.background.lock().await;
        if handle.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        *handle = Some(tokio::spawn(async move {
            manager.run_loop().await;
        }));
    }

    /// Stop the background loop. An in-flight drain pass is not interrupted
    /// beyond task cancellation at its next await point; entries stay
    /// queued either way.
    pub async fn stop(&self) {
        if let Some(handle) = self.background.lock().await.take() {
            handle.abort();
        }
    }

    async fn run_loop(self: Arc<Self>) {
        let mut connectivity = self.connectivity.clone();
        loop {
            while !*connectivity.borrow() {
                if connectivity.changed().await.is_err() {
                    return;
                }
            }
            info!("connectivity restored, starting periodic sync drain");

            let mut ticker =
                tokio::time::interval(Duration::from_secs(SYNC_DRAIN_INTERVAL_SECS));
            loop {
                tokio::select! {
                    // The first tick completes immediately, giving the
                    // offline-to-online edge its instant drain.
                    _ = ticker.tick() => {
                        if let Err(e) = self.drain().await {
                            debug!("periodic drain failed: {}", e);
                        }
                    }
                    changed = connectivity.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !*connectivity.borrow() {
                            info!("connectivity lost, pausing sync drain");
                            break;
                        }
                    }
                }
            }
        }
    }
}
