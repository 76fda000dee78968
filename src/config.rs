//! Configuration management for tou-rates
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{Result, TariffError};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Environment variable that replaces `openei.api_key`
pub const API_KEY_ENV: &str = "TOU_RATES_API_KEY";

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rate database connection settings
    pub openei: OpenEiConfig,

    /// Utility and rate plan selected at setup time
    pub plan: PlanConfig,

    /// Refresh cadence
    pub refresh: RefreshConfig,

    /// Optional flat gas rate passed through to every record
    pub gas: Option<GasConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Status endpoint binding
    pub web: WebConfig,

    /// IANA timezone used for local time-of-use evaluation
    pub timezone: String,

    /// Check the API key once before entering the refresh loop
    #[serde(default = "default_true")]
    pub validate_on_startup: bool,
}

/// OpenEI Utility Rate Database connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenEiConfig {
    /// API key from apps.openei.org
    pub api_key: String,

    /// Endpoint for every request
    pub base_url: String,

    /// Per-attempt timeout in seconds
    pub timeout_seconds: u64,

    /// Total attempts per request, including the first
    pub max_attempts: u32,

    /// Base of the exponential backoff, in seconds
    pub backoff_base_seconds: u64,
}

/// Selected utility and rate plan
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanConfig {
    /// EIA id of the utility
    pub utility_id: String,

    /// Display name of the utility
    pub utility_name: String,

    /// OpenEI plan label passed as `getpage`
    pub rate_plan_id: String,

    /// Display name of the rate plan
    pub rate_plan_name: String,
}

/// Refresh cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between rate resolutions
    pub update_interval_seconds: u64,

    /// Hours before a cached tariff is re-fetched
    pub fetch_interval_hours: u64,
}

/// Unit a gas rate is quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GasUnit {
    #[default]
    Therm,
    Ccf,
}

impl GasUnit {
    /// Price unit label, e.g. `$/therm`
    pub fn price_label(&self) -> &'static str {
        match self {
            Self::Therm => "$/therm",
            Self::Ccf => "$/ccf",
        }
    }
}

/// Flat gas rate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    /// Price per unit
    pub rate: f64,

    /// Billing unit
    #[serde(default)]
    pub unit: GasUnit,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file; empty disables file logging
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Serve the status endpoint
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from an explicit path, the first default location found, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_paths = ["tou_rates.yaml", "/etc/tou-rates/config.yaml"];
                match default_paths.iter().find(|p| Path::new(p).exists()) {
                    Some(p) => Self::from_file(p)?,
                    None => Config::default(),
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.override_api_key(std::env::var(API_KEY_ENV).ok());
    }

    /// Replace the API key with a non-blank override
    pub(crate) fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key
            && !key.trim().is_empty()
        {
            self.openei.api_key = key.trim().to_string();
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| TariffError::validation("timezone".to_string(), e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.openei.api_key.trim().is_empty() {
            return Err(TariffError::validation(
                "openei.api_key",
                "API key cannot be empty",
            ));
        }

        if self.openei.base_url.trim().is_empty() {
            return Err(TariffError::validation(
                "openei.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.openei.timeout_seconds == 0 {
            return Err(TariffError::validation(
                "openei.timeout_seconds",
                "Must be greater than 0",
            ));
        }

        if self.openei.max_attempts == 0 {
            return Err(TariffError::validation(
                "openei.max_attempts",
                "Must be greater than 0",
            ));
        }

        if self.plan.rate_plan_id.trim().is_empty() {
            return Err(TariffError::validation(
                "plan.rate_plan_id",
                "Rate plan label cannot be empty",
            ));
        }

        if self.refresh.update_interval_seconds == 0 {
            return Err(TariffError::validation(
                "refresh.update_interval_seconds",
                "Must be greater than 0",
            ));
        }

        if self.refresh.fetch_interval_hours == 0 {
            return Err(TariffError::validation(
                "refresh.fetch_interval_hours",
                "Must be greater than 0",
            ));
        }

        if let Some(gas) = &self.gas
            && !(gas.rate.is_finite() && gas.rate > 0.0)
        {
            return Err(TariffError::validation("gas.rate", "Must be positive"));
        }

        if self.web.enabled && self.web.host.trim().is_empty() {
            return Err(TariffError::validation(
                "web.host",
                "Host cannot be empty",
            ));
        }

        self.tz()?;

        Ok(())
    }
}
