//! Database model for per-user preferences.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetbook_core::users::UserPreference;

#[derive(
    Queryable, Insertable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize,
    Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::user_preferences)]
#[diesel(primary_key(user_id, key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct UserPreferenceDB {
    pub user_id: i32,
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl From<UserPreferenceDB> for UserPreference {
    fn from(db: UserPreferenceDB) -> Self {
        Self {
            user_id: db.user_id,
            key: db.key,
            value: db.value,
            updated_at: db.updated_at,
        }
    }
}
