//! Database models for categories.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetbook_core::categories::Category;

#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CategoryDB {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
#[serde(rename_all = "camelCase")]
pub struct NewCategoryDB {
    pub user_id: i32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
}

impl From<CategoryDB> for Category {
    fn from(db: CategoryDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            color: db.color,
            icon: db.icon,
            is_active: db.is_active,
        }
    }
}
