//! Domain models for income sources.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeType {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

/// An income source owned by one user, with per-row sync metadata.
///
/// Invariant: `needs_sync == false` implies `synced_at` is set. `api_id` is
/// only ever written through `mark_as_synced`, never by UI-facing code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: i32,
    pub user_id: i32,
    pub amount: f64,
    pub income_type: IncomeType,
    pub source: String,
    pub frequency: Frequency,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub needs_sync: bool,
    /// Remote document id, null until the first successful sync.
    pub api_id: Option<String>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncome {
    pub user_id: i32,
    pub amount: f64,
    pub income_type: IncomeType,
    pub source: String,
    pub frequency: Frequency,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Income edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeUpdate {
    pub amount: Option<f64>,
    pub income_type: Option<IncomeType>,
    pub source: Option<String>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: Option<bool>,
    pub is_archived: Option<bool>,
}
