//! # IPL API Server Library
//!
//! HTTP surface of the IPL billing backend.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated request bodies
//! - `middleware`: Bearer token decoding
//! - `response`: Success envelopes and pagination
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
