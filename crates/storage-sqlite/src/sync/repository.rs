//! Outbox and sync-metadata repositories.
//!
//! `write_outbox_event` is transaction-scoped on purpose: entity
//! repositories call it on the same connection that just mutated the row,
//! inside the write actor's immediate transaction, so a queue entry exists
//! if and only if the mutation committed.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use async_trait::async_trait;
use budgetbook_core::errors::Result;
use budgetbook_core::sync::{
    OutboxRepositoryTrait, SyncAction, SyncEntityKind, SyncMetadataRepositoryTrait, SyncQueueEntry,
};

use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{allocation_templates, expenses, income, sync_outbox};
use crate::utils::{enum_from_db, enum_to_db};

use super::model::SyncOutboxEventDB;

/// Everything needed to append one outbox row.
#[derive(Debug, Clone)]
pub struct OutboxWriteRequest {
    pub event_id: Option<String>,
    pub entity: SyncEntityKind,
    pub action: SyncAction,
    pub local_id: i32,
    pub payload: serde_json::Value,
}

impl OutboxWriteRequest {
    pub fn new(
        entity: SyncEntityKind,
        action: SyncAction,
        local_id: i32,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: None,
            entity,
            action,
            local_id,
            payload,
        }
    }
}

/// Append an outbox row on the caller's connection. Must run inside the
/// same transaction as the row mutation it describes.
pub fn write_outbox_event(
    conn: &mut SqliteConnection,
    request: OutboxWriteRequest,
) -> Result<String> {
    let event_id = request
        .event_id
        .unwrap_or_else(|| Uuid::now_v7().to_string());
    let row = SyncOutboxEventDB {
        event_id: event_id.clone(),
        entity: enum_to_db(&request.entity)?,
        action: enum_to_db(&request.action)?,
        local_id: request.local_id,
        payload: serde_json::to_string(&request.payload)?,
        retry_count: 0,
        enqueued_at: Utc::now().to_rfc3339(),
        last_error: None,
    };

    diesel::insert_into(sync_outbox::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;

    Ok(event_id)
}

fn to_queue_entry(row: SyncOutboxEventDB) -> Result<SyncQueueEntry> {
    Ok(SyncQueueEntry {
        event_id: row.event_id,
        entity: enum_from_db(&row.entity)?,
        action: enum_from_db(&row.action)?,
        local_id: row.local_id,
        payload: row.payload,
        retry_count: row.retry_count,
        enqueued_at: row.enqueued_at,
        last_error: row.last_error,
    })
}

pub struct OutboxRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl OutboxRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl OutboxRepositoryTrait for OutboxRepository {
    fn list_pending(&self, limit: i64) -> Result<Vec<SyncQueueEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sync_outbox::table
            .order((sync_outbox::enqueued_at.asc(), sync_outbox::event_id.asc()))
            .limit(limit)
            .load::<SyncOutboxEventDB>(&mut conn)
            .map_err(StorageError::from)?;

        rows.into_iter().map(to_queue_entry).collect()
    }

    fn count_pending(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        Ok(sync_outbox::table
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?)
    }

    async fn delete_events(&self, event_ids: Vec<String>) -> Result<()> {
        if event_ids.is_empty() {
            return Ok(());
        }

        self.writer
            .exec(move |conn| {
                diesel::delete(sync_outbox::table.filter(sync_outbox::event_id.eq_any(event_ids)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn record_failure(&self, event_id: String, error: String) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::update(sync_outbox::table.find(event_id))
                    .set((
                        sync_outbox::retry_count.eq(sync_outbox::retry_count + 1),
                        sync_outbox::last_error.eq(Some(error)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

pub struct SyncMetadataRepository {
    writer: WriteHandle,
}

impl SyncMetadataRepository {
    pub fn new(writer: WriteHandle) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl SyncMetadataRepositoryTrait for SyncMetadataRepository {
    async fn mark_as_synced(
        &self,
        entity: SyncEntityKind,
        local_id: i32,
        remote_id: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                match entity {
                    SyncEntityKind::Income => match remote_id {
                        Some(rid) => diesel::update(income::table.find(local_id))
                            .set((
                                income::needs_sync.eq(false),
                                income::synced_at.eq(Some(now)),
                                income::api_id.eq(Some(rid)),
                            ))
                            .execute(conn),
                        None => diesel::update(income::table.find(local_id))
                            .set((income::needs_sync.eq(false), income::synced_at.eq(Some(now))))
                            .execute(conn),
                    },
                    SyncEntityKind::Expense => match remote_id {
                        Some(rid) => diesel::update(expenses::table.find(local_id))
                            .set((
                                expenses::needs_sync.eq(false),
                                expenses::synced_at.eq(Some(now)),
                                expenses::api_id.eq(Some(rid)),
                            ))
                            .execute(conn),
                        None => diesel::update(expenses::table.find(local_id))
                            .set((
                                expenses::needs_sync.eq(false),
                                expenses::synced_at.eq(Some(now)),
                            ))
                            .execute(conn),
                    },
                    SyncEntityKind::Allocation => match remote_id {
                        Some(rid) => diesel::update(allocation_templates::table.find(local_id))
                            .set((
                                allocation_templates::needs_sync.eq(false),
                                allocation_templates::synced_at.eq(Some(now)),
                                allocation_templates::api_id.eq(Some(rid)),
                            ))
                            .execute(conn),
                        None => diesel::update(allocation_templates::table.find(local_id))
                            .set((
                                allocation_templates::needs_sync.eq(false),
                                allocation_templates::synced_at.eq(Some(now)),
                            ))
                            .execute(conn),
                    },
                }
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
