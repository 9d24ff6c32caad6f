//! Wire types for the sync backend REST API.
//!
//! The backend predates this client and is not fully consistent: login
//! responses come in two shapes and create responses park the new document
//! id in different slots per entity. Normalization lives here so the
//! client and the sync engine only ever see one shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use budgetbook_core::allocations::AllocationTemplateWithBuckets;
use budgetbook_core::expenses::{Expense, ExpenseStatus};
use budgetbook_core::income::{Frequency, Income, IncomeType};
use budgetbook_core::sync::SyncEntityKind;

use crate::error::{Result, SyncClientError};

/// Error body the backend sends for non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: String,
    pub code: String,
    pub message: String,
}

/// `POST/PUT /expenses` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    pub title: String,
    pub amount: f64,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: ExpenseStatus,
    /// Category label as the backend knows it; the engine resolves the
    /// local category row to its name and falls back to the raw id.
    pub category: String,
}

impl ExpensePayload {
    pub fn from_expense(expense: &Expense, category: impl Into<String>) -> Self {
        Self {
            title: expense.title.clone(),
            amount: expense.amount,
            description: expense.description.clone(),
            due_date: expense.due_date.clone(),
            status: expense.status,
            category: category.into(),
        }
    }
}

/// `POST/PUT /income` request body.
///
/// The backend has no income-type field; primary income maps to its
/// "salary" category and everything else to "freelance". It also expects
/// `isRecurring` always true and mirrors the source into the description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomePayload {
    pub source: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub start_date: String,
    pub category: String,
    pub is_recurring: bool,
    pub description: String,
}

impl IncomePayload {
    pub fn from_income(income: &Income) -> Self {
        let category = match income.income_type {
            IncomeType::Primary => "salary",
            IncomeType::Secondary => "freelance",
        };
        Self {
            source: income.source.clone(),
            amount: income.amount,
            frequency: income.frequency,
            start_date: income.start_date.clone(),
            category: category.to_string(),
            is_recurring: true,
            description: income.source.clone(),
        }
    }
}

/// `POST/PUT /allocations` request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPayload {
    pub name: String,
    pub buckets: Vec<AllocationBucketPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBucketPayload {
    pub category_id: Option<i32>,
    pub legacy_label: Option<String>,
    pub percentage: f64,
    pub target_amount: Option<f64>,
}

impl AllocationPayload {
    pub fn from_template(template: &AllocationTemplateWithBuckets) -> Self {
        Self {
            name: template.template.name.clone(),
            buckets: template
                .buckets
                .iter()
                .map(|bucket| AllocationBucketPayload {
                    category_id: bucket.category_id,
                    legacy_label: bucket.legacy_label.clone(),
                    percentage: bucket.percentage,
                    target_amount: bucket.target_amount,
                })
                .collect(),
        }
    }
}

/// `POST /auth/login` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/refresh` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// A normalized authenticated session, regardless of which login response
/// shape the backend produced. This is also what the session layer persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Remote user document, kept verbatim.
    pub user: Value,
}

/// Normalize a login response.
///
/// Current backend shape: `{success, data: {user, tokens: {accessToken,
/// refreshToken}}}`. Legacy flat shape: `{token, refreshToken, user}`.
/// Anything else is a protocol error.
pub fn parse_login_response(body: &Value) -> Result<AuthSession> {
    if let Some(access) = body
        .pointer("/data/tokens/accessToken")
        .and_then(Value::as_str)
    {
        return Ok(AuthSession {
            access_token: access.to_string(),
            refresh_token: body
                .pointer("/data/tokens/refreshToken")
                .and_then(Value::as_str)
                .map(str::to_string),
            user: body.pointer("/data/user").cloned().unwrap_or(Value::Null),
        });
    }

    if let Some(access) = body.get("token").and_then(Value::as_str) {
        return Ok(AuthSession {
            access_token: access.to_string(),
            refresh_token: body
                .get("refreshToken")
                .and_then(Value::as_str)
                .map(str::to_string),
            user: body.get("user").cloned().unwrap_or(Value::Null),
        });
    }

    Err(SyncClientError::protocol(
        "login response carries no access token in a known slot",
    ))
}

/// Normalize a refresh response: `{token, refreshToken?}`.
pub fn parse_refresh_response(body: &Value) -> Result<(String, Option<String>)> {
    let access = body
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncClientError::protocol("refresh response carries no token"))?;
    let refresh = body
        .get("refreshToken")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok((access.to_string(), refresh))
}

fn id_at<'a>(body: &'a Value, pointer: &str) -> Option<&'a Value> {
    body.pointer(pointer).filter(|v| !v.is_null())
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Pull the remote document id out of a create/update response.
///
/// Each entity endpoint parks the id somewhere else; the accepted slots per
/// entity are closed lists, and any other shape is a [`SyncClientError::Protocol`]
/// so a drifting backend surfaces as a typed, permanent failure instead of
/// a silent re-create on every drain.
pub fn extract_remote_id(entity: SyncEntityKind, body: &Value) -> Result<String> {
    let slots: &[&str] = match entity {
        SyncEntityKind::Expense => &["/id", "/expense/_id"],
        SyncEntityKind::Income => &["/income/_id", "/_id", "/id"],
        SyncEntityKind::Allocation => &["/id", "/allocation/_id"],
    };

    slots
        .iter()
        .find_map(|pointer| id_at(body, pointer).and_then(id_to_string))
        .ok_or_else(|| {
            SyncClientError::protocol(format!(
                "no remote id found in {:?} response (checked {})",
                entity,
                slots.join(", ")
            ))
        })
}
