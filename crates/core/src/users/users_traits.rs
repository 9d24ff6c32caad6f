//! Repository contracts for users and preferences.

use async_trait::async_trait;

use super::{NewUser, User, UserPreference, UserUpdate};
use crate::errors::Result;

#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    fn get_user(&self, user_id: i32) -> Result<User>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn create_user(&self, new_user: NewUser) -> Result<User>;
    async fn update_user(&self, user_id: i32, update: UserUpdate) -> Result<User>;
}

#[async_trait]
pub trait PreferenceRepositoryTrait: Send + Sync {
    fn get_preferences(&self, user_id: i32) -> Result<Vec<UserPreference>>;
    async fn set_preference(&self, user_id: i32, key: String, value: String) -> Result<()>;
}
