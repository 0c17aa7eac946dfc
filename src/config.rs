//! Runtime configuration.
//!
//! Precedence, lowest first: built-in defaults, YAML file
//! (`--config` or `~/.btcwatch/config.yaml`), environment, CLI flags.
//! The defaults reproduce the fixed behaviour: CoinGecko bitcoin/usd,
//! 60s cadence, 3 attempts, 5s/10s backoffs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_API_BASE: &str = "BTCWATCH_API_BASE";
pub const ENV_INTERVAL_SECS: &str = "BTCWATCH_INTERVAL_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_base: String,
    pub coin: String,
    pub currency: String,
    pub interval_secs: u32,
    pub max_attempts: u32,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub transport_backoff_secs: u64,
    pub rate_limit_backoff_secs: u64,
    pub server_backoff_secs: u64,
    /// How long shutdown waits for the keyboard thread before detaching it.
    pub shutdown_join_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.coingecko.com/api/v3".into(),
            coin: "bitcoin".into(),
            currency: "usd".into(),
            interval_secs: 60,
            max_attempts: 3,
            connect_timeout_secs: 5,
            read_timeout_secs: 5,
            transport_backoff_secs: 5,
            rate_limit_backoff_secs: 10,
            server_backoff_secs: 5,
            shutdown_join_ms: 500,
        }
    }
}

impl Config {
    /// Load from `path` (or the default location if it exists), then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(raw) = lookup(ENV_INTERVAL_SECS) {
            self.interval_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_INTERVAL_SECS,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        for (name, value) in [
            ("api_base", &self.api_base),
            ("coin", &self.coin),
            ("currency", &self.currency),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

/// `~/.btcwatch/config.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".btcwatch").join("config.yaml"))
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
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.rate_limit_backoff_secs, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "interval_secs: 30\ncurrency: eur\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.currency, "eur");
        assert_eq!(config.coin, "bitcoin");
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "\n").unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "intervall_secs: 30\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config {
            interval_secs: 30,
            ..Config::default()
        };
        config
            .apply_env(env(&[
                (ENV_INTERVAL_SECS, " 15 "),
                (ENV_API_BASE, "http://127.0.0.1:9000"),
            ]))
            .unwrap();

        assert_eq!(config.interval_secs, 15);
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_bad_env_value_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[(ENV_INTERVAL_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_INTERVAL_SECS, .. }));
    }

    #[test]
    fn test_validation() {
        let zero_interval = Config {
            interval_secs: 0,
            ..Config::default()
        };
        assert!(zero_interval.validate().is_err());

        let zero_attempts = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(zero_attempts.validate().is_err());

        let blank_coin = Config {
            coin: "  ".into(),
            ..Config::default()
        };
        assert!(blank_coin.validate().is_err());
    }
}
