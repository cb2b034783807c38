//! Middleware for the API server
//!
//! - `auth`: optional bearer token decoding

pub mod auth;
