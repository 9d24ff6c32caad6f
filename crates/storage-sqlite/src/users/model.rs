//! Database models for users.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use budgetbook_core::users::User;

#[derive(
    Queryable, Identifiable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct UserDB {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub currency: String,
    pub financial_goals: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[serde(rename_all = "camelCase")]
pub struct NewUserDB {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub currency: String,
    pub financial_goals: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserDB> for User {
    fn from(db: UserDB) -> Self {
        Self {
            id: db.id,
            email: db.email,
            password_hash: db.password_hash,
            name: db.name,
            currency: db.currency,
            financial_goals: db.financial_goals,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
