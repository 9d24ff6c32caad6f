//! SQLite storage implementation for Budgetbook.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `budgetbook-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - The durable sync outbox
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. All other crates are database-agnostic and work with traits.
//!
//! Mutations of synced entities (income, expenses, allocation templates) go
//! through the write actor, which runs the row change and its outbox entry
//! in one immediate transaction. Reads come straight from the pool.

pub mod db;
pub mod errors;
pub mod schema;

mod utils;

// Repository implementations
pub mod allocations;
pub mod categories;
pub mod expenses;
pub mod income;
pub mod preferences;
pub mod sync;
pub mod users;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer,
    verify_connection, DbConnection, DbPool, WriteHandle,
};

// Re-export storage errors
pub use errors::StorageError;

// Re-export from budgetbook-core for convenience
pub use budgetbook_core::errors::{DatabaseError, Error, Result};
