//! Database model for the sync outbox.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One durable outbox row. `entity` and `action` hold the snake_case wire
/// names of the core enums.
#[derive(
    Queryable, Insertable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize,
    Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::sync_outbox)]
#[diesel(primary_key(event_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SyncOutboxEventDB {
    pub event_id: String,
    pub entity: String,
    pub action: String,
    pub local_id: i32,
    pub payload: String,
    pub retry_count: i32,
    pub enqueued_at: String,
    pub last_error: Option<String>,
}
