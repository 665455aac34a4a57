//! # Questline Shared Library
//!
//! This crate contains the data model and business logic used by the
//! Questline API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool, migrations, and the unit-of-work store
//! - `ledger`: Points/coins awards for habit and task completion
//! - `exchange`: Reward catalog redemption
//! - `friends`: Friendship lifecycle and listing
//! - `progress`: Per-user progress aggregation and comparison
//! - `error`: Common error types

pub mod auth;
pub mod db;
pub mod error;
pub mod exchange;
pub mod friends;
pub mod ledger;
pub mod models;
pub mod progress;

/// Current version of the Questline shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
