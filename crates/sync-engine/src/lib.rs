//! Background sync engine for Budgetbook.
//!
//! Drains the durable outbox written by the storage layer against the
//! remote API, in enqueue order, with a bounded retry budget per entry.
//! Everything is injected: repositories, the API client (behind the
//! [`api::RemoteApi`] seam) and a `watch` channel carrying connectivity.

pub mod api;
pub mod manager;
pub mod reconcile;

mod handlers;
#[cfg(test)]
mod testing;

pub use api::RemoteApi;
pub use manager::{DrainStatus, DrainSummary, SyncQueueManager};
pub use reconcile::ProfileReconciler;
