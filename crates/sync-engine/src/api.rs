//! Remote API seam for the sync engine.
//!
//! The engine only talks to the backend through this trait, so tests
//! script remote outcomes without a server and the HTTP client stays
//! swappable.

use async_trait::async_trait;

use budgetbook_core::conflict::ProfileSnapshot;
use budgetbook_sync_client::{
    AllocationPayload, ApiClient, ExpensePayload, IncomePayload, Result,
};

#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn create_expense(&self, payload: &ExpensePayload) -> Result<String>;
    async fn update_expense(&self, remote_id: &str, payload: &ExpensePayload) -> Result<()>;
    async fn delete_expense(&self, remote_id: &str) -> Result<()>;

    async fn create_income(&self, payload: &IncomePayload) -> Result<String>;
    async fn update_income(&self, remote_id: &str, payload: &IncomePayload) -> Result<()>;
    async fn delete_income(&self, remote_id: &str) -> Result<()>;

    async fn create_allocation(&self, payload: &AllocationPayload) -> Result<String>;
    async fn update_allocation(&self, remote_id: &str, payload: &AllocationPayload) -> Result<()>;
    async fn delete_allocation(&self, remote_id: &str) -> Result<()>;

    async fn get_profile(&self) -> Result<ProfileSnapshot>;
    async fn update_profile(&self, profile: &ProfileSnapshot) -> Result<()>;
}

#[async_trait]
impl RemoteApi for ApiClient {
    async fn create_expense(&self, payload: &ExpensePayload) -> Result<String> {
        ApiClient::create_expense(self, payload).await
    }

    async fn update_expense(&self, remote_id: &str, payload: &ExpensePayload) -> Result<()> {
        ApiClient::update_expense(self, remote_id, payload).await
    }

    async fn delete_expense(&self, remote_id: &str) -> Result<()> {
        ApiClient::delete_expense(self, remote_id).await
    }

    async fn create_income(&self, payload: &IncomePayload) -> Result<String> {
        ApiClient::create_income(self, payload).await
    }

    async fn update_income(&self, remote_id: &str, payload: &IncomePayload) -> Result<()> {
        ApiClient::update_income(self, remote_id, payload).await
    }

    async fn delete_income(&self, remote_id: &str) -> Result<()> {
        ApiClient::delete_income(self, remote_id).await
    }

    async fn create_allocation(&self, payload: &AllocationPayload) -> Result<String> {
        ApiClient::create_allocation(self, payload).await
    }

    async fn update_allocation(&self, remote_id: &str, payload: &AllocationPayload) -> Result<()> {
        ApiClient::update_allocation(self, remote_id, payload).await
    }

    async fn delete_allocation(&self, remote_id: &str) -> Result<()> {
        ApiClient::delete_allocation(self, remote_id).await
    }

    async fn get_profile(&self) -> Result<ProfileSnapshot> {
        ApiClient::get_profile(self).await
    }

    async fn update_profile(&self, profile: &ProfileSnapshot) -> Result<()> {
        ApiClient::update_profile(self, profile).await
    }
}
