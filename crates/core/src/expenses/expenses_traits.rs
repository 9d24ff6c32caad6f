//! Repository contract for expenses.

use async_trait::async_trait;

use super::{Expense, ExpenseUpdate, NewExpense};
use crate::errors::Result;

#[async_trait]
pub trait ExpenseRepositoryTrait: Send + Sync {
    /// Active, non-archived rows unless `include_archived` is set.
    fn get_expenses_by_user(&self, user_id: i32, include_archived: bool) -> Result<Vec<Expense>>;
    fn get_expense(&self, expense_id: i32) -> Result<Expense>;
    async fn create_expense(&self, new_expense: NewExpense) -> Result<Expense>;
    async fn update_expense(&self, expense_id: i32, update: ExpenseUpdate) -> Result<Expense>;
    async fn delete_expense(&self, expense_id: i32) -> Result<()>;
}
