//! HTTP client for the Budgetbook sync backend.
//!
//! Thin reqwest wrapper plus the normalization glue the backend needs:
//! two login response shapes, per-entity remote-id slots, and a single
//! refresh-and-replay on 401. Session tokens live in an injected
//! [`budgetbook_core::secrets::SecretStore`] slot.

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiRetryClass, Result, SyncClientError};
pub use session::SessionContext;
pub use types::{
    extract_remote_id, AllocationBucketPayload, AllocationPayload, AuthSession, ExpensePayload,
    IncomePayload,
};
