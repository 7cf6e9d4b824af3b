//! Authentication Service Library
//!
//! Issues, validates, and revokes signed bearer tokens for accounts stored in
//! PostgreSQL, with Redis as a read-through credential cache and revocation
//! ledger.
//!
//! # Modules
//!
//! - `cache` - Ephemeral cache interface and Redis implementation
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Token gate middleware
//! - `models` - Data models
//! - `repositories` - Database access layer
//! - `routes` - Route assembly
//! - `services` - Business logic layer

pub mod cache;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
