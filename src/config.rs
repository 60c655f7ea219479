use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::auth::DEFAULT_PIN_ITERATIONS;

/// Environment variable holding the PIN for non-interactive commands.
pub const PIN_ENV: &str = "TRADETRACKR_PIN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Override for the data directory (defaults to the platform data dir)
  pub data_dir: Option<PathBuf>,
  /// Currency symbol used when formatting money
  pub currency: String,
  pub assets: AssetsConfig,
  pub security: SecurityConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_dir: None,
      currency: "£".to_string(),
      assets: AssetsConfig::default(),
      security: SecurityConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetsConfig {
  /// Base URL of the web shell whose assets are cached offline
  pub origin: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
  /// PBKDF2 rounds for new PIN digests
  pub pin_iterations: u32,
}

impl Default for SecurityConfig {
  fn default() -> Self {
    Self {
      pin_iterations: DEFAULT_PIN_ITERATIONS,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tradetrackr.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tradetrackr/config.yaml
  ///
  /// Falls back to defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("tradetrackr.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tradetrackr").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    if config.security.pin_iterations == 0 {
      return Err(eyre!("security.pin_iterations must be at least 1"));
    }
    Ok(config)
  }

  /// Directory holding the database, cache and logs.
  pub fn data_dir(&self) -> Result<PathBuf> {
    match &self.data_dir {
      Some(dir) => Ok(dir.clone()),
      None => dirs::data_dir()
        .map(|d| d.join("tradetrackr"))
        .ok_or_else(|| eyre!("Could not determine a data directory. Set data_dir in the config.")),
    }
  }

  pub fn database_path(&self) -> Result<PathBuf> {
    Ok(self.data_dir()?.join("data.db"))
  }

  pub fn cache_path(&self) -> Result<PathBuf> {
    Ok(self.data_dir()?.join("cache.db"))
  }

  pub fn log_dir(&self) -> Result<PathBuf> {
    Ok(self.data_dir()?.join("logs"))
  }

  /// Asset origin, required by the offline cache commands.
  pub fn asset_origin(&self) -> Result<&Url> {
    self.assets.origin.as_ref().ok_or_else(|| {
      eyre!("No asset origin configured. Set assets.origin in the config file.")
    })
  }

  /// Get the PIN from the environment.
  pub fn get_pin() -> Option<String> {
    std::env::var(PIN_ENV).ok().filter(|p| !p.is_empty())
  }
}
