//! Budgetbook core: database-agnostic domain models, validation and sync
//! contracts for the offline-first personal-finance tracker.
//!
//! This crate never talks to SQLite or the network directly. Storage lives in
//! `budgetbook-storage-sqlite`, the remote API client in
//! `budgetbook-sync-client`, and the queue drain orchestration in
//! `budgetbook-sync-engine`; all of them depend on the types and traits
//! defined here.

pub mod allocations;
pub mod categories;
pub mod conflict;
pub mod errors;
pub mod expenses;
pub mod income;
pub mod secrets;
pub mod sync;
pub mod users;
pub mod validation;

pub use errors::{DatabaseError, Error, Result, ValidationError};
