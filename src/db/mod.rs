//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and versioned migrations
//! - SQLite pragma configuration
//! - The SQLite implementation of the entity store

pub mod migrations;
pub mod store;

pub use migrations::init_db;
pub use store::SqliteStore;
