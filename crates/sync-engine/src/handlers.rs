//! Per-entity sync handlers.
//!
//! A handler turns one durable queue entry into remote calls, bridging the
//! two id spaces: locally rows have integer ids, remotely documents have
//! string ids. The bridge is the `api_id` captured in the snapshot:
//!
//! - create: POST, hand the returned remote id back for `mark_as_synced`;
//! - update without `api_id`: the row has never reached the backend (or the
//!   create is still queued behind this entry), so the update is sent as a
//!   create. A create that is still in flight elsewhere can make this a
//!   duplicate; the drain order makes that window small but not zero.
//! - delete without `api_id`: the backend never saw the row, nothing to do.

use std::sync::Arc;

use budgetbook_core::allocations::AllocationTemplateWithBuckets;
use budgetbook_core::categories::CategoryRepositoryTrait;
use budgetbook_core::expenses::Expense;
use budgetbook_core::income::Income;
use budgetbook_core::sync::{SyncAction, SyncEntityKind, SyncQueueEntry};
use budgetbook_core::validation::{sanitize, validate_expense, ValidatedEntity};
use budgetbook_sync_client::{
    AllocationPayload, ExpensePayload, IncomePayload, Result, SyncClientError,
};

use crate::api::RemoteApi;

pub(crate) struct EntryHandlers {
    api: Arc<dyn RemoteApi>,
    categories: Arc<dyn CategoryRepositoryTrait>,
}

impl EntryHandlers {
    pub(crate) fn new(
        api: Arc<dyn RemoteApi>,
        categories: Arc<dyn CategoryRepositoryTrait>,
    ) -> Self {
        Self { api, categories }
    }

    /// Run one queue entry against the backend. Returns the remote id when
    /// this pass produced a new one that must be persisted locally.
    pub(crate) async fn dispatch(&self, entry: &SyncQueueEntry) -> Result<Option<String>> {
        match entry.entity {
            SyncEntityKind::Expense => self.sync_expense(entry).await,
            SyncEntityKind::Income => self.sync_income(entry).await,
            SyncEntityKind::Allocation => self.sync_allocation(entry).await,
        }
    }

    async fn sync_expense(&self, entry: &SyncQueueEntry) -> Result<Option<String>> {
        let raw: serde_json::Value = serde_json::from_str(&entry.payload)?;
        let clean = sanitize(&raw, ValidatedEntity::Expense);
        let report = validate_expense(&clean);
        if !report.is_valid {
            return Err(SyncClientError::invalid_request(format!(
                "expense snapshot rejected: {}",
                report.errors.join("; ")
            )));
        }

        // The sanitized value is what goes out: trimmed strings and
        // canonical RFC3339 dates, not the raw snapshot.
        let expense: Expense = serde_json::from_value(clean)?;
        let payload = ExpensePayload::from_expense(&expense, self.category_label(&expense));

        match entry.action {
            SyncAction::Create => Ok(Some(self.api.create_expense(&payload).await?)),
            SyncAction::Update => match &expense.api_id {
                Some(remote_id) => {
                    self.api.update_expense(remote_id, &payload).await?;
                    Ok(None)
                }
                None => Ok(Some(self.api.create_expense(&payload).await?)),
            },
            SyncAction::Delete => match &expense.api_id {
                Some(remote_id) => {
                    self.api.delete_expense(remote_id).await?;
                    Ok(None)
                }
                None => Ok(None),
            },
        }
    }

    async fn sync_income(&self, entry: &SyncQueueEntry) -> Result<Option<String>> {
        let income: Income = serde_json::from_str(&entry.payload)?;
        let payload = IncomePayload::from_income(&income);

        match entry.action {
            SyncAction::Create => Ok(Some(self.api.create_income(&payload).await?)),
            SyncAction::Update => match &income.api_id {
                Some(remote_id) => {
                    self.api.update_income(remote_id, &payload).await?;
                    Ok(None)
                }
                None => Ok(Some(self.api.create_income(&payload).await?)),
            },
            SyncAction::Delete => match &income.api_id {
                Some(remote_id) => {
                    self.api.delete_income(remote_id).await?;
                    Ok(None)
                }
                None => Ok(None),
            },
        }
    }

    async fn sync_allocation(&self, entry: &SyncQueueEntry) -> Result<Option<String>> {
        let template: AllocationTemplateWithBuckets = serde_json::from_str(&entry.payload)?;
        let payload = AllocationPayload::from_template(&template);

        match entry.action {
            SyncAction::Create => Ok(Some(self.api.create_allocation(&payload).await?)),
            SyncAction::Update => match &template.template.api_id {
                Some(remote_id) => {
                    self.api.update_allocation(remote_id, &payload).await?;
                    Ok(None)
                }
                None => Ok(Some(self.api.create_allocation(&payload).await?)),
            },
            SyncAction::Delete => match &template.template.api_id {
                Some(remote_id) => {
                    self.api.delete_allocation(remote_id).await?;
                    Ok(None)
                }
                None => Ok(None),
            },
        }
    }

    /// The backend wants a category label, not our row id. Falls back to
    /// the raw id when the category row is gone.
    fn category_label(&self, expense: &Expense) -> String {
        self.categories
            .get_category(expense.category_id)
            .map(|category| category.name)
            .unwrap_or_else(|_| expense.category_id.to_string())
    }
}
