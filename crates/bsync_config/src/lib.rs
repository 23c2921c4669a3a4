//! Parsing and validation of `bsync.toml` sync configuration files.
//!
//! This crate reads the per-workspace configuration file and produces a
//! strongly-typed [`SyncConfig`]. Every section is optional; an empty file
//! yields the defaults.

#![warn(missing_docs)]

pub mod error;
pub mod exclusions;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use exclusions::LibraryExclusions;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
