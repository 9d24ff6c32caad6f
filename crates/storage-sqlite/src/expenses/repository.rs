use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use budgetbook_core::errors::{DatabaseError, Error, Result, ValidationError};
use budgetbook_core::expenses::{Expense, ExpenseRepositoryTrait, ExpenseUpdate, NewExpense};
use budgetbook_core::sync::{SyncAction, SyncEntityKind};

use super::model::{ExpenseDB, NewExpenseDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{categories, expenses};
use crate::sync::{write_outbox_event, OutboxWriteRequest};
use crate::utils::enum_to_db;

pub struct ExpenseRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ExpenseRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

/// Field rules shared by create and update; updates check the merged row
/// so a partial edit can never push a stored expense out of range.
fn validate_expense_fields(amount: f64, title: &str) -> Result<()> {
    if amount <= 0.0 {
        return Err(Error::Validation(ValidationError::OutOfRange {
            field: "amount".to_string(),
            reason: "must be greater than zero".to_string(),
        }));
    }
    if title.trim().is_empty() {
        return Err(Error::Validation(ValidationError::MissingField(
            "title".to_string(),
        )));
    }
    Ok(())
}

/// The FK alone only proves the category exists; ownership by the same user
/// is checked here so one user's expense can never point into another
/// user's category set.
fn check_category_ownership(
    conn: &mut SqliteConnection,
    category_id: i32,
    user_id: i32,
) -> Result<()> {
    let owner = categories::table
        .find(category_id)
        .select(categories::user_id)
        .first::<i32>(conn)
        .optional()
        .map_err(StorageError::from)?;

    match owner {
        Some(owner_id) if owner_id == user_id => Ok(()),
        _ => Err(Error::Database(DatabaseError::ForeignKeyViolation(format!(
            "category {} does not exist for user {}",
            category_id, user_id
        )))),
    }
}

fn enqueue_expense_event(
    conn: &mut SqliteConnection,
    action: SyncAction,
    snapshot: &Expense,
) -> Result<()> {
    write_outbox_event(
        conn,
        OutboxWriteRequest::new(
            SyncEntityKind::Expense,
            action,
            snapshot.id,
            serde_json::to_value(snapshot)?,
        ),
    )?;
    Ok(())
}

#[async_trait]
impl ExpenseRepositoryTrait for ExpenseRepository {
    fn get_expenses_by_user(&self, user_id: i32, include_archived: bool) -> Result<Vec<Expense>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = expenses::table
            .filter(expenses::user_id.eq(user_id))
            .into_boxed();
        if !include_archived {
            query = query
                .filter(expenses::is_active.eq(true))
                .filter(expenses::is_archived.eq(false));
        }
        let rows = query
            .order(expenses::created_at.asc())
            .load::<ExpenseDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(ExpenseDB::into_domain).collect()
    }

    fn get_expense(&self, expense_id: i32) -> Result<Expense> {
        let mut conn = get_connection(&self.pool)?;
        expenses::table
            .find(expense_id)
            .first::<ExpenseDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_domain()
    }

    async fn create_expense(&self, new_expense: NewExpense) -> Result<Expense> {
        validate_expense_fields(new_expense.amount, &new_expense.title)?;

        self.writer
            .exec(move |conn| {
                check_category_ownership(conn, new_expense.category_id, new_expense.user_id)?;

                let now = Utc::now().to_rfc3339();
                let row = NewExpenseDB {
                    user_id: new_expense.user_id,
                    category_id: new_expense.category_id,
                    amount: new_expense.amount,
                    title: new_expense.title.trim().to_string(),
                    description: new_expense.description,
                    due_date: new_expense.due_date,
                    status: enum_to_db(&new_expense.status)?,
                    expense_type: enum_to_db(&new_expense.expense_type)?,
                    is_recurring: new_expense.is_recurring,
                    recurrence_end: new_expense.recurrence_end,
                    is_active: true,
                    is_archived: false,
                    needs_sync: true,
                    created_at: now.clone(),
                    updated_at: now,
                };

                let inserted = diesel::insert_into(expenses::table)
                    .values(&row)
                    .returning(ExpenseDB::as_returning())
                    .get_result::<ExpenseDB>(conn)
                    .map_err(StorageError::from)?
                    .into_domain()?;

                enqueue_expense_event(conn, SyncAction::Create, &inserted)?;
                Ok(inserted)
            })
            .await
    }

    async fn update_expense(&self, expense_id: i32, update: ExpenseUpdate) -> Result<Expense> {
        self.writer
            .exec(move |conn| {
                let mut row = expenses::table
                    .find(expense_id)
                    .first::<ExpenseDB>(conn)
                    .map_err(StorageError::from)?;

                if let Some(category_id) = update.category_id {
                    check_category_ownership(conn, category_id, row.user_id)?;
                    row.category_id = category_id;
                }
                if let Some(amount) = update.amount {
                    row.amount = amount;
                }
                if let Some(title) = update.title {
                    row.title = title.trim().to_string();
                }
                if let Some(description) = update.description {
                    row.description = Some(description);
                }
                if let Some(due_date) = update.due_date {
                    row.due_date = Some(due_date);
                }
                if let Some(status) = update.status {
                    row.status = enum_to_db(&status)?;
                }
                if let Some(expense_type) = update.expense_type {
                    row.expense_type = enum_to_db(&expense_type)?;
                }
                if let Some(is_recurring) = update.is_recurring {
                    row.is_recurring = is_recurring;
                }
                if let Some(recurrence_end) = update.recurrence_end {
                    row.recurrence_end = Some(recurrence_end);
                }
                if let Some(is_active) = update.is_active {
                    row.is_active = is_active;
                }
                if let Some(is_archived) = update.is_archived {
                    row.is_archived = is_archived;
                }
                validate_expense_fields(row.amount, &row.title)?;
                row.needs_sync = true;
                row.updated_at = Utc::now().to_rfc3339();

                diesel::update(expenses::table.find(expense_id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let updated = row.into_domain()?;
                enqueue_expense_event(conn, SyncAction::Update, &updated)?;
                Ok(updated)
            })
            .await
    }

    async fn delete_expense(&self, expense_id: i32) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let snapshot = expenses::table
                    .find(expense_id)
                    .first::<ExpenseDB>(conn)
                    .map_err(StorageError::from)?
                    .into_domain()?;

                diesel::delete(expenses::table.find(expense_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                enqueue_expense_event(conn, SyncAction::Delete, &snapshot)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetbook_core::categories::{CategoryRepositoryTrait, NewCategory};
    use budgetbook_core::expenses::{ExpenseStatus, ExpenseType};
    use budgetbook_core::users::{NewUser, UserRepositoryTrait};
    use tempfile::tempdir;

    use crate::categories::CategoryRepository;
    use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool};
    use crate::users::UserRepository;

    struct Fixture {
        expenses: ExpenseRepository,
        categories: CategoryRepository,
        users: UserRepository,
        user_id: i32,
        category_id: i32,
    }

    async fn setup() -> Fixture {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        let pool: Arc<DbPool> = create_pool(&db_path).expect("create pool");
        run_migrations(&pool).expect("migrate db");
        let writer = spawn_writer(pool.as_ref().clone());

        let users = UserRepository::new(pool.clone(), writer.clone());
        let user = users
            .create_user(NewUser {
                email: "expenses@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: "Spender".to_string(),
                currency: "EUR".to_string(),
                financial_goals: None,
            })
            .await
            .expect("create user");

        let categories = CategoryRepository::new(pool.clone(), writer.clone());
        let category = categories
            .create_category(NewCategory {
                user_id: user.id,
                name: "Groceries".to_string(),
                color: "#4CAF50".to_string(),
                icon: "cart".to_string(),
            })
            .await
            .expect("create category");

        Fixture {
            expenses: ExpenseRepository::new(pool, writer),
            categories,
            users,
            user_id: user.id,
            category_id: category.id,
        }
    }

    fn rent(user_id: i32, category_id: i32) -> NewExpense {
        NewExpense {
            user_id,
            category_id,
            amount: 1200.0,
            title: "Rent".to_string(),
            description: None,
            due_date: Some("2026-09-01".to_string()),
            status: ExpenseStatus::Pending,
            expense_type: ExpenseType::Regular,
            is_recurring: true,
            recurrence_end: None,
        }
    }

    #[tokio::test]
    async fn create_and_reload_round_trip() {
        let fx = setup().await;
        let created = fx
            .expenses
            .create_expense(rent(fx.user_id, fx.category_id))
            .await
            .expect("create");
        assert!(created.needs_sync);
        assert_eq!(created.status, ExpenseStatus::Pending);

        let reloaded = fx.expenses.get_expense(created.id).expect("reload");
        assert_eq!(reloaded, created);
    }

    #[tokio::test]
    async fn unknown_category_is_a_foreign_key_violation() {
        let fx = setup().await;
        let err = fx
            .expenses
            .create_expense(rent(fx.user_id, 9999))
            .await
            .expect_err("bad category");
        assert!(matches!(
            err,
            Error::Database(DatabaseError::ForeignKeyViolation(_))
        ));
    }

    #[tokio::test]
    async fn another_users_category_is_a_foreign_key_violation() {
        let fx = setup().await;
        let other = fx
            .users
            .create_user(NewUser {
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: "Other".to_string(),
                currency: "EUR".to_string(),
                financial_goals: None,
            })
            .await
            .expect("other user");
        let foreign_category = fx
            .categories
            .create_category(NewCategory {
                user_id: other.id,
                name: "Private".to_string(),
                color: "#111111".to_string(),
                icon: "lock".to_string(),
            })
            .await
            .expect("foreign category");

        let err = fx
            .expenses
            .create_expense(rent(fx.user_id, foreign_category.id))
            .await
            .expect_err("cross-user category");
        assert!(matches!(
            err,
            Error::Database(DatabaseError::ForeignKeyViolation(_))
        ));
    }

    #[tokio::test]
    async fn update_with_non_positive_amount_is_rejected() {
        let fx = setup().await;
        let created = fx
            .expenses
            .create_expense(rent(fx.user_id, fx.category_id))
            .await
            .expect("create");

        let err = fx
            .expenses
            .update_expense(
                created.id,
                ExpenseUpdate {
                    amount: Some(-50.0),
                    ..Default::default()
                },
            )
            .await
            .expect_err("negative amount");
        assert!(matches!(
            err,
            Error::Validation(ValidationError::OutOfRange { .. })
        ));

        // the rejected edit never reached the row
        let reloaded = fx.expenses.get_expense(created.id).expect("reload");
        assert_eq!(reloaded.amount, 1200.0);
    }

    #[tokio::test]
    async fn update_with_blank_title_is_rejected() {
        let fx = setup().await;
        let created = fx
            .expenses
            .create_expense(rent(fx.user_id, fx.category_id))
            .await
            .expect("create");

        let err = fx
            .expenses
            .update_expense(
                created.id,
                ExpenseUpdate {
                    title: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("blank title");
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField(_))
        ));
        assert_eq!(fx.expenses.get_expense(created.id).expect("reload").title, "Rent");
    }

    #[tokio::test]
    async fn update_can_move_expense_between_own_categories() {
        let fx = setup().await;
        let created = fx
            .expenses
            .create_expense(rent(fx.user_id, fx.category_id))
            .await
            .expect("create");

        let second = fx
            .categories
            .create_category(NewCategory {
                user_id: fx.user_id,
                name: "Housing".to_string(),
                color: "#9C27B0".to_string(),
                icon: "home".to_string(),
            })
            .await
            .expect("second category");

        let moved = fx
            .expenses
            .update_expense(
                created.id,
                ExpenseUpdate {
                    category_id: Some(second.id),
                    status: Some(ExpenseStatus::Paid),
                    ..Default::default()
                },
            )
            .await
            .expect("move");
        assert_eq!(moved.category_id, second.id);
        assert_eq!(moved.status, ExpenseStatus::Paid);
        assert!(moved.needs_sync);
    }
}
