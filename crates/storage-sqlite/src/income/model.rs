//! Database models for income sources.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetbook_core::errors::Result;
use budgetbook_core::income::Income;

use crate::utils::enum_from_db;

#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::income)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct IncomeDB {
    pub id: i32,
    pub user_id: i32,
    pub amount: f64,
    pub income_type: String,
    pub source: String,
    pub frequency: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
    pub needs_sync: bool,
    pub api_id: Option<String>,
    pub synced_at: Option<String>,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::income)]
#[serde(rename_all = "camelCase")]
pub struct NewIncomeDB {
    pub user_id: i32,
    pub amount: f64,
    pub income_type: String,
    pub source: String,
    pub frequency: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub needs_sync: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl IncomeDB {
    pub fn into_domain(self) -> Result<Income> {
        Ok(Income {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            income_type: enum_from_db(&self.income_type)?,
            source: self.source,
            frequency: enum_from_db(&self.frequency)?,
            start_date: self.start_date,
            end_date: self.end_date,
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
