//! Main application configuration
//!
//! This module defines the primary configuration structures for the ranker,
//! including environment variable loading, TOML files and validation.

use crate::comparisons::log::DEFAULT_MAX_LEN;
use crate::comparisons::repository::{RepositoryLimits, DEFAULT_PAGE_SIZE};
use crate::config::rating::EloConfig;
use crate::matchup::selector::MatchupConfig;
use crate::rating::estimate::{EstimateBucketer, DEFAULT_ESTIMATE_SCALE};
use crate::report::DEFAULT_MIN_ESTIMATE_COMPARISONS;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: EloConfig,
    pub matchup: MatchupConfig,
    pub estimates: EstimateSettings,
    pub storage: StorageSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Estimate scale used for recommended estimates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSettings {
    /// Ordered estimate values, smallest first
    pub scale: Vec<f64>,
    /// Effort comparisons needed before an estimate can be out of date
    pub min_comparisons: u32,
}

/// Comparison log storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the JSON comparison logs
    pub data_dir: PathBuf,
    /// Comparisons fetched per page when loading a log
    pub page_size: usize,
    /// Comparisons kept per property before the oldest are trimmed
    pub max_len: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "pairwise-ranker".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for EstimateSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_ESTIMATE_SCALE.to_vec(),
            min_comparisons: DEFAULT_MIN_ESTIMATE_COMPARISONS,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            page_size: DEFAULT_PAGE_SIZE,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl StorageSettings {
    pub fn limits(&self) -> RepositoryLimits {
        RepositoryLimits {
            page_size: self.page_size,
            max_len: self.max_len,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(rating) = env::var("ELO_INITIAL_RATING") {
            self.rating.initial_rating = parse_value("ELO_INITIAL_RATING", &rating)?;
        }
        if let Ok(denominator) = env::var("ELO_DENOMINATOR") {
            self.rating.denominator = parse_value("ELO_DENOMINATOR", &denominator)?;
        }
        if let Ok(thresholds) = env::var("ELO_THRESHOLDS") {
            self.rating.thresholds = parse_list("ELO_THRESHOLDS", &thresholds)?;
        }
        if let Ok(k_factors) = env::var("ELO_K_FACTORS") {
            self.rating.k_factors = parse_list("ELO_K_FACTORS", &k_factors)?;
        }

        // Matchup settings
        if let Ok(group_size) = env::var("MATCHUP_GROUP_SIZE") {
            self.matchup.group_size = parse_value("MATCHUP_GROUP_SIZE", &group_size)?;
        }
        if let Ok(weight) = env::var("MATCHUP_ANCHOR_BIAS") {
            self.matchup.anchor_bias_weight = parse_value("MATCHUP_ANCHOR_BIAS", &weight)?;
        }
        if let Ok(weight) = env::var("MATCHUP_PROXIMITY_BIAS") {
            self.matchup.proximity_bias_weight = parse_value("MATCHUP_PROXIMITY_BIAS", &weight)?;
        }

        // Estimate settings
        if let Ok(scale) = env::var("ESTIMATE_SCALE") {
            self.estimates.scale = parse_list("ESTIMATE_SCALE", &scale)?;
        }
        if let Ok(min) = env::var("ESTIMATE_MIN_COMPARISONS") {
            self.estimates.min_comparisons = parse_value("ESTIMATE_MIN_COMPARISONS", &min)?;
        }

        // Storage settings
        if let Ok(data_dir) = env::var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(page_size) = env::var("COMPARISON_PAGE_SIZE") {
            self.storage.page_size = parse_value("COMPARISON_PAGE_SIZE", &page_size)?;
        }
        if let Ok(max_len) = env::var("COMPARISON_MAX_LEN") {
            self.storage.max_len = parse_value("COMPARISON_MAX_LEN", &max_len)?;
        }

        Ok(())
    }

    /// Bucketer for the configured estimate scale
    pub fn estimate_bucketer(&self) -> Result<EstimateBucketer> {
        EstimateBucketer::new(self.estimates.scale.clone())
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

fn parse_list<T: FromStr>(name: &str, value: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_value(name, item))
        .collect()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    config.rating.validate()?;
    config.matchup.validate()?;
    config.estimate_bucketer()?;

    // Validate storage settings
    if config.storage.page_size == 0 {
        return Err(anyhow!("Comparison page size must be greater than 0"));
    }
    if config.storage.max_len == 0 {
        return Err(anyhow!("Comparison log length must be greater than 0"));
    }

    Ok(())
}
