//! Layered configuration loading for toolite consumers

use crate::{Error, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable selecting the environment-specific config files
pub const ENV_SELECTOR: &str = "TOOLITE_ENV";

/// Prefix for environment variable overrides (`TOOLITE_DEBOUNCE__DELAY_MS=50`)
pub const ENV_PREFIX: &str = "TOOLITE_";

/// Default configuration directory
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Load configuration from the default `config/` directory
///
/// See [`load_config_in`] for the merge order.
pub fn load_config<T>(app_name: &str) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Default,
{
    load_config_in(DEFAULT_CONFIG_DIR, app_name)
}

/// Load configuration from multiple sources rooted at `dir`
///
/// Priority (highest to lowest):
/// 1. Environment variables (`TOOLITE_` prefix, `__` separates nested keys)
/// 2. Application file (e.g., `toolite.yaml`)
/// 3. Local config file (e.g., `local.yaml`)
/// 4. Environment-specific file (e.g., `production.yaml`)
/// 5. Default config file (e.g., `default.yaml`)
/// 6. `T::default()`
pub fn load_config_in<T, P>(dir: P, app_name: &str) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Default,
    P: AsRef<Path>,
{
    let dir = dir.as_ref();
    let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());
    debug!("Loading {} configuration from {:?} (env: {})", app_name, dir, env);

    let mut figment = Figment::from(Serialized::defaults(T::default()));
    for stem in ["default", env.as_str(), "local", app_name] {
        figment = figment
            .merge(Toml::file(dir.join(format!("{}.toml", stem))))
            .merge(Yaml::file(dir.join(format!("{}.yaml", stem))))
            .merge(Json::file(dir.join(format!("{}.json", stem))));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))
}

/// Load configuration from a specific file
pub fn load_config_from_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

    let figment = match extension {
        "toml" => Figment::new().merge(Toml::file(path)),
        "yaml" | "yml" => Figment::new().merge(Yaml::file(path)),
        "json" => Figment::new().merge(Json::file(path)),
        _ => {
            return Err(Error::Config(format!(
                "Unsupported config file format: {}",
                extension
            )))
        },
    };

    figment
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration from file: {}", e)))
}

/// Save configuration to a file
pub fn save_config_to_file<T, P>(config: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = match extension {
        "toml" => toml::to_string_pretty(config)?,
        "yaml" | "yml" => serde_yaml::to_string(config)?,
        "json" => serde_json::to_string_pretty(config)?,
        _ => {
            return Err(Error::Config(format!(
                "Unsupported config file format: {}",
                extension
            )))
        },
    };

    std::fs::write(path, content)?;
    Ok(())
}
