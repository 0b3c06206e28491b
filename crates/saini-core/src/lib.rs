//! # saini-core
//!
//! Core types, configuration, and utilities for Saini.
//!
//! This crate provides shared functionality used across all Saini crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the config file
//! - **Types**: Emotional tiers and check-in records
//! - **Utilities**: Path resolution and environment handling

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use types::{CheckIn, Tier};
