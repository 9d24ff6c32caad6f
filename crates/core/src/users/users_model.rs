//! Domain models for users.

use serde::{Deserialize, Serialize};

/// A registered user. Owns categories, income, expenses, allocation
/// templates and preferences. Users are never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    /// Stored lower-cased; uniqueness is case-insensitive.
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub currency: String,
    /// Serialized financial-goals blob (JSON), opaque to the store.
    pub financial_goals: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub currency: String,
    pub financial_goals: Option<String>,
}

/// Profile edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub financial_goals: Option<String>,
}

/// Per-user preference row (key/value, upserted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    pub user_id: i32,
    pub key: String,
    pub value: String,
    pub updated_at: String,
}
