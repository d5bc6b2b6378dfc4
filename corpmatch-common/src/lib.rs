//! # corpmatch Common Library
//!
//! Shared code for the corpmatch crates including:
//! - Error type and result alias
//! - TOML configuration model and loading
//! - Logging initialisation
//! - Timestamp and UUID helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod time;
pub mod uuid_utils;

pub use config::{LoggingConfig, ResolverSettings, TomlConfig};
pub use error::{Error, Result};
