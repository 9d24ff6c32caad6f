//! Scripted remote API double shared by the engine's test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use budgetbook_core::conflict::ProfileSnapshot;
use budgetbook_sync_client::{
    AllocationPayload, ExpensePayload, IncomePayload, Result, SyncClientError,
};

use crate::api::RemoteApi;

/// Records every call in order; can be scripted to fail each entity call
/// with a fixed HTTP status or to delay before answering.
#[derive(Default)]
pub(crate) struct MockRemoteApi {
    calls: Mutex<Vec<String>>,
    fail_status: Mutex<Option<u16>>,
    delay: Mutex<Option<Duration>>,
    last_expense: Mutex<Option<ExpensePayload>>,
    pub(crate) remote_profile: Mutex<Option<ProfileSnapshot>>,
    id_counter: AtomicUsize,
}

impl MockRemoteApi {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn last_expense(&self) -> Option<ExpensePayload> {
        self.last_expense.lock().expect("payload lock").clone()
    }

    pub(crate) fn fail_with(&self, status: Option<u16>) {
        *self.fail_status.lock().expect("fail lock") = status;
    }

    pub(crate) fn delay_each_call(&self, delay: Duration) {
        *self.delay.lock().expect("delay lock") = Some(delay);
    }

    async fn record(&self, call: impl Into<String>) -> Result<()> {
        let delay = *self.delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().expect("calls lock").push(call.into());
        match *self.fail_status.lock().expect("fail lock") {
            Some(status) => Err(SyncClientError::api(status, "scripted failure")),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!(
            "{}-{}",
            prefix,
            self.id_counter.fetch_add(1, Ordering::SeqCst) + 1
        )
    }
}

#[async_trait]
impl RemoteApi for MockRemoteApi {
    async fn create_expense(&self, payload: &ExpensePayload) -> Result<String> {
        *self.last_expense.lock().expect("payload lock") = Some(payload.clone());
        self.record("create_expense").await?;
        Ok(self.next_id("expense"))
    }

    async fn update_expense(&self, remote_id: &str, payload: &ExpensePayload) -> Result<()> {
        *self.last_expense.lock().expect("payload lock") = Some(payload.clone());
        self.record(format!("update_expense:{}", remote_id)).await
    }

    async fn delete_expense(&self, remote_id: &str) -> Result<()> {
        self.record(format!("delete_expense:{}", remote_id)).await
    }

    async fn create_income(&self, _payload: &IncomePayload) -> Result<String> {
        self.record("create_income").await?;
        Ok(self.next_id("income"))
    }

    async fn update_income(&self, remote_id: &str, _payload: &IncomePayload) -> Result<()> {
        self.record(format!("update_income:{}", remote_id)).await
    }

    async fn delete_income(&self, remote_id: &str) -> Result<()> {
        self.record(format!("delete_income:{}", remote_id)).await
    }

    async fn create_allocation(&self, _payload: &AllocationPayload) -> Result<String> {
        self.record("create_allocation").await?;
        Ok(self.next_id("allocation"))
    }

    async fn update_allocation(&self, remote_id: &str, _payload: &AllocationPayload) -> Result<()> {
        self.record(format!("update_allocation:{}", remote_id)).await
    }

    async fn delete_allocation(&self, remote_id: &str) -> Result<()> {
        self.record(format!("delete_allocation:{}", remote_id)).await
    }

    async fn get_profile(&self) -> Result<ProfileSnapshot> {
        self.record("get_profile").await?;
        self.remote_profile
            .lock()
            .expect("profile lock")
            .clone()
            .ok_or_else(|| SyncClientError::protocol("no remote profile scripted"))
    }

    async fn update_profile(&self, _profile: &ProfileSnapshot) -> Result<()> {
        self.record("update_profile").await
    }
}
