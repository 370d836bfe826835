use std::path::PathBuf;
use std::time::Duration;

use dirs::home_dir;
use log::error;

use crate::DEFAULT_API_URL;
use crate::coordinates::Coordinate;
use crate::search::rank::SortKey;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
  #[serde(default)]
  pub config_path: Option<PathBuf>,
  #[serde(default)]
  pub api_url: Option<String>,
  #[serde(default)]
  pub request_timeout_secs: Option<u64>,
  #[serde(default)]
  pub default_sort: SortKey,
  /// Fixed position override for hosts without a live location source.
  #[serde(default)]
  pub fixed_position: Option<Coordinate>,
}

impl Config {
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();
    let default = Self::default();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&default);

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  #[must_use]
  pub fn api_url(&self) -> &str {
    self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
  }

  #[must_use]
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
  }

  fn from_env() -> Self {
    let config_path = std::env::var("PHARMSEEK_CONFIG").ok().map(PathBuf::from);
    let api_url = std::env::var("PHARMSEEK_API_URL").ok();
    let request_timeout_secs = std::env::var("PHARMSEEK_TIMEOUT_SECS")
      .ok()
      .and_then(|v| v.parse().ok());

    Self {
      config_path,
      api_url,
      request_timeout_secs,
      default_sort: SortKey::default(),
      fixed_position: None,
    }
  }

  fn merge(mut self, other: &Self) -> Self {
    self.config_path = self.config_path.or(other.config_path.clone());
    self.api_url = self.api_url.or(other.api_url.clone());
    self.request_timeout_secs = self.request_timeout_secs.or(other.request_timeout_secs);
    self.fixed_position = self.fixed_position.or(other.fixed_position);

    if self.default_sort == SortKey::default() || other.default_sort != SortKey::default() {
      self.default_sort = other.default_sort;
    }

    self
  }

  fn from_file() -> Option<Self> {
    let config_path = std::env::var("PHARMSEEK_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("pharmseek")))?;
    let config_path = config_path.join("config.json");

    serde_json::from_str(&std::fs::read_to_string(&config_path).ok()?)
      .inspect_err(|e| error!("Failed to read config file: {e}"))
      .ok()?
  }

  fn init_cfg_file(&self) {
    if let Some(path) = &self.config_path {
      if !path.exists() {
        let _ = std::fs::create_dir_all(path).inspect_err(|e| {
          error!("Failed to create config directory: {e}");
        });
      }

      let path = path.join("config.json");
      if !path.exists() {
        let config = serde_json::to_string_pretty(self);
        if let Ok(config) = config {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        } else {
          error!("Failed to serialize config");
        }
      }
    }
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      config_path: home_dir().map(|p| p.join(".config").join("pharmseek")),
      api_url: Some(DEFAULT_API_URL.to_string()),
      request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
      default_sort: SortKey::default(),
      fixed_position: None,
    }
  }
}
