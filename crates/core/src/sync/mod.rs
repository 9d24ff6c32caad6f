//! Sync queue domain models and storage contracts.
//!
//! The sync queue is a durable, append-only outbox: every local mutation of
//! a synced entity writes a queue entry in the same transaction as the row
//! change. The engine crate drains the queue against the remote API and
//! reports outcomes back through the traits below.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Maximum delivery attempts per queue entry. An entry that fails this many
/// times is dropped with its full payload logged for forensic recovery.
pub const MAX_SYNC_ATTEMPTS: i32 = 3;

/// Periodic drain cadence while the device is online, in seconds.
pub const SYNC_DRAIN_INTERVAL_SECS: u64 = 30;

/// Entities that participate in background sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEntityKind {
    Expense,
    Income,
    Allocation,
}

/// Supported queue actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Create,
    Update,
    Delete,
}

/// One durable queue entry: a full entity snapshot captured at mutation
/// time. The engine only ever works on these copies, never on live rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    pub event_id: String,
    pub entity: SyncEntityKind,
    pub action: SyncAction,
    pub local_id: i32,
    /// JSON snapshot of the entity at enqueue time.
    pub payload: String,
    pub retry_count: i32,
    pub enqueued_at: String,
    pub last_error: Option<String>,
}

/// Durable queue contract implemented by the storage layer.
///
/// `list_pending` returns entries in enqueue order; the engine relies on
/// that for FIFO draining.
#[async_trait]
pub trait OutboxRepositoryTrait: Send + Sync {
    fn list_pending(&self, limit: i64) -> Result<Vec<SyncQueueEntry>>;
    fn count_pending(&self) -> Result<i64>;
    /// Remove entries that synced or exhausted their retry budget.
    async fn delete_events(&self, event_ids: Vec<String>) -> Result<()>;
    /// Record a failed attempt; the entry stays queued for the next drain.
    async fn record_failure(&self, event_id: String, error: String) -> Result<()>;
}

/// Sync-metadata bookkeeping contract. This is the only path that ever
/// populates `api_id` on a local row.
#[async_trait]
pub trait SyncMetadataRepositoryTrait: Send + Sync {
    /// Clear `needs_sync`, stamp `synced_at`, and store the remote id when
    /// one was returned by the API.
    async fn mark_as_synced(
        &self,
        entity: SyncEntityKind,
        local_id: i32,
        remote_id: Option<String>,
    ) -> Result<()>;
}
