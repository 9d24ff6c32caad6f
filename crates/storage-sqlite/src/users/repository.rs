use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use budgetbook_core::errors::{Error, Result, ValidationError};
use budgetbook_core::users::{NewUser, User, UserRepositoryTrait, UserUpdate};

use super::model::{NewUserDB, UserDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::users;

pub struct UserRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl UserRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    fn get_user(&self, user_id: i32) -> Result<User> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .find(user_id)
            .first::<UserDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(User::from(row))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .filter(users::email.eq(email.trim().to_lowercase()))
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let email = new_user.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "email".to_string(),
            )));
        }
        if new_user.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }

        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let row = NewUserDB {
                    email,
                    password_hash: new_user.password_hash,
                    name: new_user.name.trim().to_string(),
                    currency: new_user.currency,
                    financial_goals: new_user.financial_goals,
                    created_at: now.clone(),
                    updated_at: now,
                };

                // A duplicate email surfaces as a unique violation here.
                let inserted = diesel::insert_into(users::table)
                    .values(&row)
                    .returning(UserDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(User::from(inserted))
            })
            .await
    }

    async fn update_user(&self, user_id: i32, update: UserUpdate) -> Result<User> {
        self.writer
            .exec(move |conn| {
                let mut row = users::table
                    .find(user_id)
                    .first::<UserDB>(conn)
                    .map_err(StorageError::from)?;

                if let Some(name) = update.name {
                    row.name = name;
                }
                if let Some(currency) = update.currency {
                    row.currency = currency;
                }
                if let Some(goals) = update.financial_goals {
                    row.financial_goals = Some(goals);
                }
                row.updated_at = Utc::now().to_rfc3339();

                diesel::update(users::table.find(user_id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(User::from(row))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetbook_core::errors::DatabaseError;
    use tempfile::tempdir;

    use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool};

    async fn setup_repo() -> UserRepository {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        let pool: Arc<DbPool> = create_pool(&db_path).expect("create pool");
        run_migrations(&pool).expect("migrate db");
        let writer = spawn_writer(pool.as_ref().clone());
        UserRepository::new(pool, writer)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Ana".to_string(),
            currency: "EUR".to_string(),
            financial_goals: None,
        }
    }

    #[tokio::test]
    async fn create_lowercases_email_and_lookup_is_case_insensitive() {
        let repo = setup_repo().await;
        let created = repo
            .create_user(new_user("  Ana@Example.COM "))
            .await
            .expect("create");
        assert_eq!(created.email, "ana@example.com");

        let found = repo
            .get_user_by_email("ANA@example.com")
            .expect("lookup")
            .expect("some");
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let repo = setup_repo().await;
        repo.create_user(new_user("ana@example.com"))
            .await
            .expect("create");

        let err = repo
            .create_user(new_user("Ana@Example.com"))
            .await
            .expect_err("duplicate");
        assert!(matches!(
            err,
            Error::Database(DatabaseError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn update_touches_only_provided_fields() {
        let repo = setup_repo().await;
        let created = repo
            .create_user(new_user("ana@example.com"))
            .await
            .expect("create");

        let updated = repo
            .update_user(
                created.id,
                UserUpdate {
                    currency: Some("USD".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.currency, "USD");
        assert_eq!(updated.name, created.name);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let repo = setup_repo().await;
        let err = repo.get_user(999).expect_err("missing");
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }
}
