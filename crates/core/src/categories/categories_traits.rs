//! Repository contract for categories.

use async_trait::async_trait;

use super::{Category, NewCategory};
use crate::errors::Result;

#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    fn get_categories_by_user(&self, user_id: i32, active_only: bool) -> Result<Vec<Category>>;
    fn get_category(&self, category_id: i32) -> Result<Category>;
    async fn create_category(&self, new_category: NewCategory) -> Result<Category>;
    async fn update_category(&self, category_id: i32, name: String, color: String, icon: String)
        -> Result<Category>;
    /// Soft delete: clears `is_active`, keeps the row for referencing expenses.
    async fn deactivate_category(&self, category_id: i32) -> Result<()>;
}
