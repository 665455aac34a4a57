//! Database models for Questline.
//!
//! Each model owns its SQL. Reads take `&PgPool`; writes that must compose
//! into a transaction take `impl PgExecutor<'_>` so the business components
//! can run them inside a unit of work.
//!
//! # Models
//!
//! - `user`: accounts, roles, and the points/coins/level state
//! - `habit`: recurring habits and their completion evidence rows
//! - `task`: one-off tasks with the award-bearing completion transition
//! - `reward`: the redeemable catalog and redemption records
//! - `friendship`: pair-unique friendship rows and their lifecycle

pub mod friendship;
pub mod habit;
pub mod reward;
pub mod task;
pub mod user;
