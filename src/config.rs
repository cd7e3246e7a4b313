use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::MAX_TTL_DAYS;
use crate::db;
use crate::livsmedel::RetryPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub livsmedelsverket: LivsmedelConfig,
  pub cache: CacheConfig,
  pub diary: DiaryConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LivsmedelConfig {
  /// Base URL of the food database API
  pub url: String,
  pub timeout_ms: u64,
  /// Retries after the first attempt for transient failures
  pub max_retries: u32,
  /// Backoff before retry n is base * 2^n
  pub retry_base_delay_ms: u64,
}

impl Default for LivsmedelConfig {
  fn default() -> Self {
    Self {
      url: "https://webservice.livsmedelsverket.se/livsmedel/v1".to_string(),
      timeout_ms: 10_000,
      max_retries: 3,
      retry_base_delay_ms: 1_000,
    }
  }
}

impl LivsmedelConfig {
  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_retries: self.max_retries,
      base_delay: Duration::from_millis(self.retry_base_delay_ms),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub ttl_days: i64,
  /// Stored with every cache entry
  pub api_version: String,
  /// Keep the cache in SQLite; otherwise in memory for the process lifetime
  pub persistent: bool,
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_days: 7,
      api_version: "1".to_string(),
      persistent: true,
      path: None,
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> chrono::Duration {
    chrono::Duration::days(self.ttl_days.clamp(0, MAX_TTL_DAYS))
  }

  pub fn resolved_path(&self) -> Result<PathBuf> {
    match &self.path {
      Some(p) => Ok(p.clone()),
      None => db::default_path("cache.db"),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiaryConfig {
  pub path: Option<PathBuf>,
}

impl DiaryConfig {
  pub fn resolved_path(&self) -> Result<PathBuf> {
    match &self.path {
      Some(p) => Ok(p.clone()),
      None => db::default_path("diary.db"),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Default filter directive; RUST_LOG takes precedence
  pub level: String,
  /// Log to this file instead of stderr
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./dietlog.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/dietlog/config.yaml
  ///
  /// Without a config file the defaults are used.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("dietlog.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("dietlog").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is valid and means all defaults
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// Override settings from LIVSMEDELSVERKET_API_URL,
  /// LIVSMEDELSVERKET_API_TIMEOUT (ms) and CACHE_TTL_DAYS.
  fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(url) = var("LIVSMEDELSVERKET_API_URL") {
      self.livsmedelsverket.url = url;
    }
    if let Some(timeout) = var("LIVSMEDELSVERKET_API_TIMEOUT") {
      self.livsmedelsverket.timeout_ms = timeout
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid LIVSMEDELSVERKET_API_TIMEOUT '{}': {}", timeout, e))?;
    }
    if let Some(days) = var("CACHE_TTL_DAYS") {
      self.cache.ttl_days = days
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid CACHE_TTL_DAYS '{}': {}", days, e))?;
    }
    Ok(())
  }

  fn validate(&self) -> Result<()> {
    if !(0..=MAX_TTL_DAYS).contains(&self.cache.ttl_days) {
      return Err(eyre!(
        "cache.ttl_days must be between 0 and {}, got {}",
        MAX_TTL_DAYS,
        self.cache.ttl_days
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = Config::parse("").unwrap();

    assert_eq!(
      config.livsmedelsverket.url,
      "https://webservice.livsmedelsverket.se/livsmedel/v1"
    );
    assert_eq!(config.livsmedelsverket.timeout_ms, 10_000);
    assert_eq!(config.cache.ttl_days, 7);
    assert_eq!(config.cache.api_version, "1");
    assert!(config.cache.persistent);
    assert_eq!(config.log.level, "info");

    let retry = config.livsmedelsverket.retry_policy();
    assert_eq!(retry.max_retries, 3);
    assert_eq!(retry.base_delay, Duration::from_secs(1));
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let yaml = r#"
livsmedelsverket:
  max_retries: 1
cache:
  persistent: false
  path: /tmp/dietlog-cache.db
log:
  level: debug
"#;
    let config = Config::parse(yaml).unwrap();

    assert_eq!(config.livsmedelsverket.max_retries, 1);
    assert_eq!(config.livsmedelsverket.timeout_ms, 10_000);
    assert!(!config.cache.persistent);
    assert_eq!(
      config.cache.resolved_path().unwrap(),
      PathBuf::from("/tmp/dietlog-cache.db")
    );
    assert_eq!(config.cache.ttl_days, 7);
    assert_eq!(config.log.level, "debug");
  }

  #[test]
  fn test_env_overrides() {
    let mut config = Config::default();
    config
      .apply_env(env(&[
        ("LIVSMEDELSVERKET_API_URL", "http://localhost:9000/v1"),
        ("LIVSMEDELSVERKET_API_TIMEOUT", "2500"),
        ("CACHE_TTL_DAYS", "1"),
      ]))
      .unwrap();

    assert_eq!(config.livsmedelsverket.url, "http://localhost:9000/v1");
    assert_eq!(config.livsmedelsverket.timeout_ms, 2500);
    assert_eq!(config.cache.ttl(), chrono::Duration::days(1));
  }

  #[test]
  fn test_invalid_env_value() {
    let mut config = Config::default();
    let err = config
      .apply_env(env(&[("CACHE_TTL_DAYS", "a week")]))
      .unwrap_err();
    assert!(err.to_string().contains("CACHE_TTL_DAYS"));
  }

  #[test]
  fn test_ttl_days_out_of_range() {
    let config = Config::parse("cache:\n  ttl_days: 100000000\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("ttl_days"));
    assert_eq!(config.cache.ttl(), chrono::Duration::days(MAX_TTL_DAYS));

    let mut config = Config::default();
    config
      .apply_env(env(&[("CACHE_TTL_DAYS", "-1")]))
      .unwrap();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config
      .apply_env(env(&[("CACHE_TTL_DAYS", "9223372036854775807")]))
      .unwrap();
    assert!(config.validate().is_err());
    assert_eq!(config.cache.ttl(), chrono::Duration::days(MAX_TTL_DAYS));

    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/dietlog.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
