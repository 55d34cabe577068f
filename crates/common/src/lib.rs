//! Shared utilities, configuration, and error handling for Kudos
//!
//! This crate provides common functionality used across the Kudos backend:
//! - Configuration management following 12-factor principles
//! - Error types and HTTP response mapping
//! - Custom axum extractors (authenticated identity, validated JSON)

pub mod config;
pub mod error;
pub mod extractors;

pub use config::Config;
pub use error::{Error, Result};
pub use extractors::{Identity, ValidatedJson};
