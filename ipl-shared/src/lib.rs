//! # IPL Shared Library
//!
//! Types, database access and business logic used by the IPL API server.
//!
//! ## Module Organization
//!
//! - `billing`: bulk monthly billing generation and the occupant report
//! - `models`: database models and their queries
//! - `db`: connection pool and embedded migrations
//! - `auth`: bearer token decoding

pub mod auth;
pub mod billing;
pub mod db;
pub mod models;

/// Current version of the IPL shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
