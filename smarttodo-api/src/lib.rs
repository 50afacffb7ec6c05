//! # Smart Todo API Server Library
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and bearer token middleware
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
