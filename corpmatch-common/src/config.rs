//! Configuration model and loading
//!
//! All resolver tuning lives here: the fuzzy-match threshold, the
//! source-reliability confidence table, completeness weights and quality
//! thresholds. None of it is hard-coded in the resolution logic, so a
//! deployment can adjust trust levels without a rebuild.
//!
//! # Settings Sources Priority
//!
//! 1. Explicit path passed by the caller
//! 2. `CORPMATCH_CONFIG` environment variable
//! 3. `<user config dir>/corpmatch/config.toml`
//! 4. Built-in defaults (code constants)
//!
//! After the file is read, `CORPMATCH_FUZZY_THRESHOLD`, `CORPMATCH_WORKERS`
//! and `CORPMATCH_BATCH_SIZE` override individual resolver settings.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "CORPMATCH_CONFIG";
/// Environment override for [`ResolverSettings::fuzzy_match_threshold`]
pub const FUZZY_THRESHOLD_ENV: &str = "CORPMATCH_FUZZY_THRESHOLD";
/// Environment override for [`ResolverSettings::workers`]
pub const WORKERS_ENV: &str = "CORPMATCH_WORKERS";
/// Environment override for [`ResolverSettings::batch_size`]
pub const BATCH_SIZE_ENV: &str = "CORPMATCH_BATCH_SIZE";

/// Default Singapore UEN shapes: business (8 digits + letter), local
/// company (9 digits + letter, year-prefixed) and other entities
/// (T/S/R + year + entity type + 4 digits + letter).
pub const DEFAULT_IDENTIFIER_PATTERN: &str =
    r"^(\d{8}[A-Z]|\d{9}[A-Z]|[TSR]\d{2}[A-Z]{2}\d{4}[A-Z])$";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Entity resolution settings
    pub resolver: ResolverSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Entity resolution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Minimum composite name similarity (0-100) for a tier-3 match
    pub fuzzy_match_threshold: u8,
    /// Fixed number of parallel batch workers
    pub workers: usize,
    /// Observations per batch when a caller splits a large input
    pub batch_size: usize,
    /// Regex an official identifier must match to be accepted
    pub identifier_pattern: String,
    /// Earliest plausible founding year
    pub founding_year_min: i32,
    /// Reliability confidence per source class
    pub source_confidence: SourceConfidence,
    /// Completeness weights per tracked field
    pub completeness_weights: CompletenessWeights,
    /// Quality status thresholds
    pub quality_thresholds: QualityThresholds,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 85,
            workers: 4,
            batch_size: 100,
            identifier_pattern: DEFAULT_IDENTIFIER_PATTERN.to_string(),
            founding_year_min: 1800,
            source_confidence: SourceConfidence::default(),
            completeness_weights: CompletenessWeights::default(),
            quality_thresholds: QualityThresholds::default(),
        }
    }
}

/// Reliability confidence (0-100) for each class of data origin
///
/// Official registries outrank a company's own website, which outranks
/// social profiles, which outrank automated discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfidence {
    pub registry: u8,
    pub website: u8,
    pub social_profile: u8,
    pub discovery: u8,
}

impl Default for SourceConfidence {
    fn default() -> Self {
        Self {
            registry: 95,
            website: 80,
            social_profile: 70,
            discovery: 50,
        }
    }
}

/// Completeness weight for each tracked field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessWeights {
    pub identifier: u32,
    pub name: u32,
    pub website: u32,
    pub industry: u32,
    pub contact_email: u32,
    /// Counted when any social profile link is present
    pub social_profile: u32,
    pub services: u32,
}

impl CompletenessWeights {
    /// Sum of all weights
    pub fn total(&self) -> u32 {
        self.identifier
            + self.name
            + self.website
            + self.industry
            + self.contact_email
            + self.social_profile
            + self.services
    }
}

impl Default for CompletenessWeights {
    fn default() -> Self {
        Self {
            identifier: 25,
            name: 25,
            website: 15,
            industry: 10,
            contact_email: 10,
            social_profile: 5,
            services: 10,
        }
    }
}

/// Minimum sub-scores for a record to pass quality review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub min_completeness: f32,
    pub min_accuracy: f32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_completeness: 50.0,
            min_accuracy: 70.0,
        }
    }
}

impl ResolverSettings {
    /// Apply `CORPMATCH_*` environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = read_env_override::<u8>(FUZZY_THRESHOLD_ENV)? {
            info!(threshold = value, "Fuzzy match threshold overridden from environment");
            self.fuzzy_match_threshold = value;
        }
        if let Some(value) = read_env_override::<usize>(WORKERS_ENV)? {
            info!(workers = value, "Worker count overridden from environment");
            self.workers = value;
        }
        if let Some(value) = read_env_override::<usize>(BATCH_SIZE_ENV)? {
            info!(batch_size = value, "Batch size overridden from environment");
            self.batch_size = value;
        }
        Ok(())
    }

    /// Reject settings the resolver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fuzzy_match_threshold > 100 {
            return Err(Error::Config(format!(
                "fuzzy_match_threshold must be 0-100, got {}",
                self.fuzzy_match_threshold
            )));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if self.completeness_weights.total() == 0 {
            return Err(Error::Config(
                "completeness_weights must not all be zero".to_string(),
            ));
        }
        regex::Regex::new(&self.identifier_pattern).map_err(|e| {
            Error::Config(format!("identifier_pattern does not compile: {}", e))
        })?;
        Ok(())
    }
}

fn read_env_override<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Locate the config file following the documented priority order
///
/// Returns `None` when no file is named and the per-user default does not
/// exist; callers then fall back to built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: explicit path
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: per-user config directory
    dirs::config_dir()
        .map(|d| d.join("corpmatch").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration, apply environment overrides and validate
///
/// A named file that does not exist is a configuration error; an absent
/// default file is not.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!(path = %path.display(), "Loading configuration");
            read_toml_config(&path)?
        }
        None => {
            warn!("No config file found, using built-in defaults");
            TomlConfig::default()
        }
    };

    config.resolver.apply_env_overrides()?;
    config.resolver.validate()?;
    debug!(?config, "Configuration resolved");
    Ok(config)
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Write a config as TOML, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
