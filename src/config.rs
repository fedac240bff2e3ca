use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[cfg(not(test))]
use etcetera::{BaseStrategy, base_strategy::choose_base_strategy};

use crate::trace::Resolution;

/// Settings applied to a [`TraceController`](crate::TraceController).
///
/// # Examples
///
/// ```toml
/// # Tracing is off unless enabled here or via CALLTREE_ENABLED
/// enabled = true
///
/// # Report unit: "ns", "us", "ms" or "sec"
/// resolution = "us"
/// ```
///
/// Config file location:
/// - Linux: `$XDG_CONFIG_HOME/calltree/config.toml` or `~/.config/calltree/config.toml`
/// - macOS: `$XDG_CONFIG_HOME/calltree/config.toml` or `~/.config/calltree/config.toml`
/// - Windows: `%APPDATA%\calltree\config.toml`
///
/// Environment variables: `CALLTREE_ENABLED`, `CALLTREE_RESOLUTION`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub resolution: Resolution,
}

impl TraceConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Config file (see struct documentation for platform-specific paths)
    /// 3. Environment variables (CALLTREE_*)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            get_config_path(),
            Environment::with_prefix("CALLTREE").try_parsing(true),
        )
    }

    fn load_from(
        config_path: Option<PathBuf>,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("enabled", defaults.enabled)?
            .set_default("resolution", defaults.resolution.unit())?;

        // Add config file if it exists
        if let Some(config_path) = config_path
            && config_path.exists()
        {
            builder = builder.add_source(File::from(config_path));
        }

        builder = builder.add_source(environment);

        builder.build()?.try_deserialize()
    }

    /// Render the configuration as it would appear in the config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {}", e)))
    }
}

fn get_config_path() -> Option<PathBuf> {
    // Explicit override (CALLTREE_CONFIG_PATH env var)
    if let Ok(path) = std::env::var("CALLTREE_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }

    // Unit tests never read the user's config
    #[cfg(test)]
    {
        None
    }

    // choose_base_strategy uses:
    // - XDG on Linux (respects XDG_CONFIG_HOME, falls back to ~/.config)
    // - XDG on macOS (~/.config instead of ~/Library/Application Support)
    // - Windows conventions on Windows (%APPDATA%)
    #[cfg(not(test))]
    {
        let strategy = choose_base_strategy().ok()?;
        Some(strategy.config_dir().join("calltree").join("config.toml"))
    }
}
