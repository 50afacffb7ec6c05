//! # Smart Todo Shared Library
//!
//! This crate contains the domain types, persistence layer and business logic
//! used by the Smart Todo API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, JWT tokens and the credential store
//! - `db`: PostgreSQL pool and migration helpers
//! - `models`: Users, tasks and tags
//! - `repository`: Storage traits with PostgreSQL and in-memory backends
//! - `stats`: Per-user task statistics

pub mod auth;
pub mod db;
pub mod models;
pub mod repository;
pub mod stats;

/// Current version of the Smart Todo shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
