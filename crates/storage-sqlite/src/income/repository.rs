use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use budgetbook_core::errors::{Error, Result, ValidationError};
use budgetbook_core::income::{Income, IncomeRepositoryTrait, IncomeUpdate, NewIncome};
use budgetbook_core::sync::{SyncAction, SyncEntityKind};

use super::model::{IncomeDB, NewIncomeDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::income;
use crate::sync::{write_outbox_event, OutboxWriteRequest};
use crate::utils::enum_to_db;

pub struct IncomeRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl IncomeRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

/// Field rules shared by create and update; updates check the merged row
/// so a partial edit can never push a stored income out of range.
fn validate_income_fields(amount: f64, source: &str) -> Result<()> {
    if amount <= 0.0 {
        return Err(Error::Validation(ValidationError::OutOfRange {
            field: "amount".to_string(),
            reason: "must be greater than zero".to_string(),
        }));
    }
    if source.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "source".to_string(),
        )));
    }
    Ok(())
}

fn enqueue_income_event(
    conn: &mut SqliteConnection,
    action: SyncAction,
    snapshot: &Income,
) -> Result<()> {
    write_outbox_event(
        conn,
        OutboxWriteRequest::new(
            SyncEntityKind::Income,
            action,
            snapshot.id,
            serde_json::to_value(snapshot)?,
        ),
    )?;
    Ok(())
}

#[async_trait]
impl IncomeRepositoryTrait for IncomeRepository {
    fn get_income_by_user(&self, user_id: i32, include_archived: bool) -> Result<Vec<Income>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = income::table.filter(income::user_id.eq(user_id)).into_boxed();
        if !include_archived {
            query = query
                .filter(income::is_active.eq(true))
                .filter(income::is_archived.eq(false));
        }
        let rows = query
            .order(income::created_at.asc())
            .load::<IncomeDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(IncomeDB::into_domain).collect()
    }

    fn get_income(&self, income_id: i32) -> Result<Income> {
        let mut conn = get_connection(&self.pool)?;
        income::table
            .find(income_id)
            .first::<IncomeDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_domain()
    }

    async fn create_income(&self, new_income: NewIncome) -> Result<Income> {
        validate_income_fields(new_income.amount, &new_income.source)?;

        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let row = NewIncomeDB {
                    user_id: new_income.user_id,
                    amount: new_income.amount,
                    income_type: enum_to_db(&new_income.income_type)?,
                    source: new_income.source.trim().to_string(),
                    frequency: enum_to_db(&new_income.frequency)?,
                    start_date: new_income.start_date,
                    end_date: new_income.end_date,
                    is_active: true,
                    is_archived: false,
                    needs_sync: true,
                    created_at: now.clone(),
                    updated_at: now,
                };

                let inserted = diesel::insert_into(income::table)
                    .values(&row)
                    .returning(IncomeDB::as_returning())
                    .get_result::<IncomeDB>(conn)
                    .map_err(StorageError::from)?
                    .into_domain()?;

                enqueue_income_event(conn, SyncAction::Create, &inserted)?;
                Ok(inserted)
            })
            .await
    }

    async fn update_income(&self, income_id: i32, update: IncomeUpdate) -> Result<Income> {
        self.writer
            .exec(move |conn| {
                let mut row = income::table
                    .find(income_id)
                    .first::<IncomeDB>(conn)
                    .map_err(StorageError::from)?;

                if let Some(amount) = update.amount {
                    row.amount = amount;
                }
                if let Some(income_type) = update.income_type {
                    row.income_type = enum_to_db(&income_type)?;
                }
                if let Some(source) = update.source {
                    row.source = source.trim().to_string();
                }
                if let Some(frequency) = update.frequency {
                    row.frequency = enum_to_db(&frequency)?;
                }
                if let Some(start_date) = update.start_date {
                    row.start_date = start_date;
                }
                if let Some(end_date) = update.end_date {
                    row.end_date = Some(end_date);
                }
                if let Some(is_active) = update.is_active {
                    row.is_active = is_active;
                }
                if let Some(is_archived) = update.is_archived {
                    row.is_archived = is_archived;
                }
                validate_income_fields(row.amount, &row.source)?;
                row.needs_sync = true;
                row.updated_at = Utc::now().to_rfc3339();

                diesel::update(income::table.find(income_id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let updated = row.into_domain()?;
                enqueue_income_event(conn, SyncAction::Update, &updated)?;
                Ok(updated)
            })
            .await
    }

    async fn delete_income(&self, income_id: i32) -> Result<()> {
        self.writer
            .exec(move |conn| {
                // Snapshot first so the queue entry carries the api_id the
                // engine needs for the remote delete.
                let snapshot = income::table
                    .find(income_id)
                    .first::<IncomeDB>(conn)
                    .map_err(StorageError::from)?
                    .into_domain()?;

                diesel::delete(income::table.find(income_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                enqueue_income_event(conn, SyncAction::Delete, &snapshot)?;
                Ok(())
            })
            .await
    }
}
