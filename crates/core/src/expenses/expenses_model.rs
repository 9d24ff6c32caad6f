//! Domain models for expenses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    Regular,
    Manual,
    Recurring,
}

/// An expense owned by one user and one category, with per-row sync
/// metadata (same contract as [`crate::income::Income`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i32,
    pub user_id: i32,
    /// Must reference a category owned by the same user.
    pub category_id: i32,
    pub amount: f64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: ExpenseStatus,
    pub expense_type: ExpenseType,
    pub is_recurring: bool,
    pub recurrence_end: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub needs_sync: bool,
    pub api_id: Option<String>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub user_id: i32,
    pub category_id: i32,
    pub amount: f64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: ExpenseStatus,
    pub expense_type: ExpenseType,
    pub is_recurring: bool,
    pub recurrence_end: Option<String>,
}

/// Expense edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub category_id: Option<i32>,
    pub amount: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<ExpenseStatus>,
    pub expense_type: Option<ExpenseType>,
    pub is_recurring: Option<bool>,
    pub recurrence_end: Option<String>,
    pub is_active: Option<bool>,
    pub is_archived: Option<bool>,
}
