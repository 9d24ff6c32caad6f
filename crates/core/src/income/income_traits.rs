//! Repository contract for income sources.

use async_trait::async_trait;

use super::{Income, IncomeUpdate, NewIncome};
use crate::errors::Result;

#[async_trait]
pub trait IncomeRepositoryTrait: Send + Sync {
    /// Active, non-archived rows unless `include_archived` is set.
    fn get_income_by_user(&self, user_id: i32, include_archived: bool) -> Result<Vec<Income>>;
    fn get_income(&self, income_id: i32) -> Result<Income>;
    async fn create_income(&self, new_income: NewIncome) -> Result<Income>;
    async fn update_income(&self, income_id: i32, update: IncomeUpdate) -> Result<Income>;
    async fn delete_income(&self, income_id: i32) -> Result<()>;
}
