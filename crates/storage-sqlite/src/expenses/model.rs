//! Database models for expenses.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetbook_core::errors::Result;
use budgetbook_core::expenses::Expense;

use crate::utils::enum_from_db;

#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDB {
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub amount: f64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
    pub expense_type: String,
    pub is_recurring: bool,
    pub recurrence_end: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
    pub needs_sync: bool,
    pub api_id: Option<String>,
    pub synced_at: Option<String>,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::expenses)]
#[serde(rename_all = "camelCase")]
pub struct NewExpenseDB {
    pub user_id: i32,
    pub category_id: i32,
    pub amount: f64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
    pub expense_type: String,
    pub is_recurring: bool,
    pub recurrence_end: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub needs_sync: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ExpenseDB {
    pub fn into_domain(self) -> Result<Expense> {
        Ok(Expense {
            id: self.id,
            user_id: self.user_id,
            category_id: self.category_id,
            amount: self.amount,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status: enum_from_db(&self.status)?,
            expense_type: enum_from_db(&self.expense_type)?,
            is_recurring: self.is_recurring,
            recurrence_end: self.recurrence_end,
            is_active: self.is_active,
            is_archived: self.is_archived,
            needs_sync: self.needs_sync,
            api_id: self.api_id,
            synced_at: self.synced_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
