/// API route handlers
///
/// - `health`: Welcome message and storage probe
/// - `auth`: Registration and form login
/// - `tasks`: Owner-scoped task CRUD and statistics

pub mod auth;
pub mod health;
pub mod tasks;
