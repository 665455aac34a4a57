//! Database layer for Questline.
//!
//! # Modules
//!
//! - `pool`: PostgreSQL connection pool management with health checks
//! - `migrations`: embedded migration runner
//! - `store`: the storage handle and unit-of-work abstraction the business
//!   components are built on
//!
//! Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;
pub mod store;
