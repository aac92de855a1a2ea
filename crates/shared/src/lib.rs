//! Shared library for the Pokédex tools.
//!
//! This crate provides common functionality used by the binary crates:
//! - Configuration management
//! - Catalog data model
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::{ApiConfig, Config};
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
