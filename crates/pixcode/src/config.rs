//! Configuration management for pixcode.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merchant::Merchant;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "pixcode";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "PIXCODE_";

/// Environment override for the PIX key, read verbatim.
const PIX_KEY_ENV: &str = "PIXCODE_MERCHANT__PIX_KEY";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PIXCODE_`, nested keys joined
///    with `__`, e.g. `PIXCODE_MERCHANT__PIX_KEY`)
/// 2. TOML config file at `~/.config/pixcode/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Receiving merchant. Payload generation requires it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant: Option<Merchant>,
    /// Output configuration.
    pub output: OutputConfig,
    /// File the configuration was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Output-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Copy generated payloads to the clipboard without `--to-clipboard`.
    pub copy_to_clipboard: bool,
    /// Print the amount and checksum next to plain-text payloads.
    pub show_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            copy_to_clipboard: false,
            show_summary: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `PIXCODE_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        let mut config = Self::from_figment(Self::figment(&config_file))?;
        config.source = Some(config_file);
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        // Env parses digit-only values as integers, dropping leading zeros.
        if let Ok(key) = std::env::var(PIX_KEY_ENV) {
            figment = figment.merge(Serialized::default("merchant.pix_key", key));
        }
        figment
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// A configured merchant must assemble into a payload, so oversized or
    /// non-ASCII fields are rejected here rather than when a payload is
    /// requested.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(merchant) = &self.merchant {
            merchant.validate()?;
        }
        Ok(())
    }

    /// Get the configured merchant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MerchantNotConfigured`] if no merchant is set. The
    /// hint names the file the configuration was loaded from.
    pub fn merchant(&self) -> Result<&Merchant> {
        self.merchant
            .as_ref()
            .ok_or_else(|| Error::MerchantNotConfigured {
                hint: self
                    .source
                    .clone()
                    .unwrap_or_else(Self::default_config_path)
                    .display()
                    .to_string(),
            })
    }
}
