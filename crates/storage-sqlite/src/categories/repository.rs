use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use budgetbook_core::categories::{Category, CategoryRepositoryTrait, NewCategory};
use budgetbook_core::errors::{Error, Result, ValidationError};

use super::model::{CategoryDB, NewCategoryDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::categories;

pub struct CategoryRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CategoryRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CategoryRepositoryTrait for CategoryRepository {
    fn get_categories_by_user(&self, user_id: i32, active_only: bool) -> Result<Vec<Category>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = categories::table
            .filter(categories::user_id.eq(user_id))
            .into_boxed();
        if active_only {
            query = query.filter(categories::is_active.eq(true));
        }
        let rows = query
            .order(categories::name.asc())
            .load::<CategoryDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn get_category(&self, category_id: i32) -> Result<Category> {
        let mut conn = get_connection(&self.pool)?;
        let row = categories::table
            .find(category_id)
            .first::<CategoryDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(Category::from(row))
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category> {
        let name = new_category.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "name".to_string(),
            )));
        }

        self.writer
            .exec(move |conn| {
                let row = NewCategoryDB {
                    user_id: new_category.user_id,
                    name,
                    color: new_category.color,
                    icon: new_category.icon,
                    is_active: true,
                };

                let inserted = diesel::insert_into(categories::table)
                    .values(&row)
                    .returning(CategoryDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Category::from(inserted))
            })
            .await
    }

    async fn update_category(
        &self,
        category_id: i32,
        name: String,
        color: String,
        icon: String,
    ) -> Result<Category> {
        self.writer
            .exec(move |conn| {
                diesel::update(categories::table.find(category_id))
                    .set((
                        categories::name.eq(name),
                        categories::color.eq(color),
                        categories::icon.eq(icon),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                let row = categories::table
                    .find(category_id)
                    .first::<CategoryDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Category::from(row))
            })
            .await
    }

    async fn deactivate_category(&self, category_id: i32) -> Result<()> {
        self.writer
            .exec(move |conn| {
                let affected = diesel::update(categories::table.find(category_id))
                    .set(categories::is_active.eq(false))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if affected == 0 {
                    return Err(StorageError::QueryFailed(diesel::result::Error::NotFound).into());
                }
                Ok(())
            })
            .await
    }
}
