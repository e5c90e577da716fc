//! Aggregated toolkit configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use toolite_common::{config, LogConfig, Result};
use toolite_timing::{DebounceConfig, DebounceOptions, ThrottleConfig, ThrottleOptions};
use toolite_utils::date::DEFAULT_PATTERN;
use toolite_utils::{ExportOptions, PasswordPolicy, TimeUnit};
use tracing::info;

/// Application name used for the `<app>.{toml,yaml,json}` config file
pub const APP_NAME: &str = "toolite";

/// Date helper defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DateConfig {
    /// Output pattern for formatting helpers
    pub pattern: String,
    /// UTC offset in hours applied when formatting, if any
    pub offset_hours: Option<i32>,
    /// Unit used by `date_diff` when none is given
    pub diff_unit: TimeUnit,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            offset_hours: None,
            diff_unit: TimeUnit::Days,
        }
    }
}

/// Complete toolkit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolkitConfig {
    pub logging: LogConfig,
    pub debounce: DebounceConfig,
    pub throttle: ThrottleConfig,
    pub date: DateConfig,
    pub password: PasswordPolicy,
    pub export: ExportOptions,
}

impl ToolkitConfig {
    /// Load from `config/` plus `TOOLITE_` environment overrides
    pub fn load() -> Result<Self> {
        let config: Self = config::load_config(APP_NAME)?;
        config.validate()?;
        info!("Loaded toolkit configuration");
        Ok(config)
    }

    /// Load from a specific configuration directory
    pub fn load_in(dir: impl AsRef<Path>) -> Result<Self> {
        let config: Self = config::load_config_in(dir, APP_NAME)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single file, format chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = config::load_config_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        config::save_config_to_file(self, path)
    }

    /// Reject negative timings and unusable password bounds
    pub fn validate(&self) -> Result<()> {
        self.debounce_options()?;
        self.throttle_options()?;
        self.password.validate()
    }

    pub fn debounce_options(&self) -> Result<DebounceOptions> {
        DebounceOptions::try_from(&self.debounce)
    }

    pub fn throttle_options(&self) -> Result<ThrottleOptions> {
        ThrottleOptions::try_from(&self.throttle)
    }
}
