/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, me)
/// - `users`: Profile management and public profiles
/// - `habits`: Habit CRUD and completion
/// - `tasks`: Task CRUD
/// - `calendar`: Date-range view over tasks and habit completions
/// - `rewards`: Reward catalog, redemption, and progress
/// - `friends`: Friendship requests, responses, and comparison
/// - `admin`: Administrative endpoints (users, stats, catalog)

pub mod health;
pub mod auth;
pub mod users;
pub mod habits;
pub mod tasks;
pub mod calendar;
pub mod rewards;
pub mod friends;
pub mod admin;
