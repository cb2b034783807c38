//! Authentication utilities
//!
//! - [`jwt`]: decoding of CMS-issued bearer tokens
//!
//! Tokens identify the caller for logging. No endpoint requires one.

pub mod jwt;
