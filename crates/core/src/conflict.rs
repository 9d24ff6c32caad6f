//! Conflict resolution between local and remote snapshots of the same
//! logical record.
//!
//! Pure functions: nothing here touches storage or the network. The
//! user-profile field set ({name, currency, financial goals, updated_at})
//! is the canonical conflict surface.

use serde::{Deserialize, Serialize};

/// The snapshot shape both sides of a conflict are normalized into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub name: String,
    pub currency: String,
    pub financial_goals: Option<String>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    LocalWins,
    RemoteWins,
    NewerWins,
    Merge,
}

/// What kind of data is being reconciled; drives the recommended strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDataType {
    UserProfile,
    Expense,
    Income,
    Allocation,
}

/// Resolution output: the merged snapshot plus an audit tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProfile {
    pub profile: ProfileSnapshot,
    pub sync_status: ConflictStrategy,
    pub conflict_resolved_at: String,
}

/// True when any user-visible profile field or the update stamp differs.
pub fn has_conflict(local: &ProfileSnapshot, remote: &ProfileSnapshot) -> bool {
    local.name != remote.name
        || local.currency != remote.currency
        || local.financial_goals != remote.financial_goals
        || local.updated_at != remote.updated_at
}

/// `Merge` for profile data (preserves independent edits to different
/// fields), `NewerWins` for everything else.
pub fn recommended_strategy(data_type: SyncDataType) -> ConflictStrategy {
    match data_type {
        SyncDataType::UserProfile => ConflictStrategy::Merge,
        _ => ConflictStrategy::NewerWins,
    }
}

pub fn resolve_conflict(
    local: &ProfileSnapshot,
    remote: &ProfileSnapshot,
    strategy: ConflictStrategy,
) -> ResolvedProfile {
    let profile = match strategy {
        ConflictStrategy::LocalWins => local.clone(),
        ConflictStrategy::RemoteWins => remote.clone(),
        ConflictStrategy::NewerWins => {
            if local_is_strictly_newer(local, remote) {
                local.clone()
            } else {
                remote.clone()
            }
        }
        ConflictStrategy::Merge => {
            // Field-level last-writer-wins: start from remote, take the
            // local value for user-editable fields only when the local
            // record timestamp is strictly newer.
            let mut merged = remote.clone();
            if local_is_strictly_newer(local, remote) {
                merged.name = local.name.clone();
                merged.currency = local.currency.clone();
                merged.financial_goals = local.financial_goals.clone();
            }
            merged
        }
    };

    ResolvedProfile {
        profile,
        sync_status: strategy,
        conflict_resolved_at: chrono::Utc::now().to_rfc3339(),
    }
}

fn effective_timestamp(snapshot: &ProfileSnapshot) -> Option<&str> {
    snapshot
        .updated_at
        .as_deref()
        .or(snapshot.created_at.as_deref())
}

/// Compare record timestamps.
///
/// Rule:
/// 1. parse both as RFC3339 and compare instants
/// 2. fall back to lexical ordering when either side is non-RFC3339
/// 3. missing timestamps never win
fn local_is_strictly_newer(local: &ProfileSnapshot, remote: &ProfileSnapshot) -> bool {
    let (Some(local_ts), remote_ts) = (effective_timestamp(local), effective_timestamp(remote))
    else {
        return false;
    };
    let Some(remote_ts) = remote_ts else {
        return true;
    };

    let local_parsed =
        chrono::DateTime::parse_from_rfc3339(local_ts).map(|dt| dt.timestamp_millis());
    let remote_parsed =
        chrono::DateTime::parse_from_rfc3339(remote_ts).map(|dt| dt.timestamp_millis());

    if let (Ok(local_ms), Ok(remote_ms)) = (local_parsed, remote_parsed) {
        return local_ms > remote_ms;
    }
    local_ts > remote_ts
}
