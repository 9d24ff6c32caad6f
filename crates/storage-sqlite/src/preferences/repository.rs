use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use budgetbook_core::errors::Result;
use budgetbook_core::users::{PreferenceRepositoryTrait, UserPreference};

use super::model::UserPreferenceDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::user_preferences;

pub struct PreferenceRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PreferenceRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PreferenceRepositoryTrait for PreferenceRepository {
    fn get_preferences(&self, user_id: i32) -> Result<Vec<UserPreference>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = user_preferences::table
            .filter(user_preferences::user_id.eq(user_id))
            .order(user_preferences::key.asc())
            .load::<UserPreferenceDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(UserPreference::from).collect())
    }

    async fn set_preference(&self, user_id: i32, key: String, value: String) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let row = UserPreferenceDB {
                    user_id,
                    key,
                    value,
                    updated_at: Utc::now().to_rfc3339(),
                };

                diesel::insert_into(user_preferences::table)
                    .values(&row)
                    .on_conflict((user_preferences::user_id, user_preferences::key))
                    .do_update()
                    .set((
                        user_preferences::value.eq(row.value.clone()),
                        user_preferences::updated_at.eq(row.updated_at.clone()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetbook_core::users::{NewUser, UserRepositoryTrait};
    use tempfile::tempdir;

    use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool};
    use crate::users::UserRepository;

    async fn setup() -> (PreferenceRepository, i32) {
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
                email: "prefs@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: "Prefs".to_string(),
                currency: "EUR".to_string(),
                financial_goals: None,
            })
            .await
            .expect("create user");

        (PreferenceRepository::new(pool, writer), user.id)
    }

    #[tokio::test]
    async fn set_preference_upserts_on_same_key() {
        let (repo, user_id) = setup().await;

        repo.set_preference(user_id, "theme".to_string(), "dark".to_string())
            .await
            .expect("set");
        repo.set_preference(user_id, "theme".to_string(), "light".to_string())
            .await
            .expect("overwrite");
        repo.set_preference(user_id, "locale".to_string(), "de-DE".to_string())
            .await
            .expect("second key");

        let prefs = repo.get_preferences(user_id).expect("list");
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[1].key, "theme");
        assert_eq!(prefs[1].value, "light");
    }
}
