//! # Runtime Configuration Module
//!
//! Server settings loaded from an optional TOML file and environment
//! variables. Environment variables always win over the file.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `CHAINR_ADDR` | `addr` | `127.0.0.1:8080` |
//! | `CHAINR_POOL_CAPACITY` | `pool_capacity` | `1024` |
//! | `CHAINR_MAX_BODY_BYTES` | `max_body_bytes` | `1048576` |
//! | `CHAINR_SHUTDOWN_TIMEOUT_SECS` | `shutdown_timeout_secs` | `5` |
//!
//! `CHAINR_MAX_BODY_BYTES` also accepts hexadecimal (`0x100000`).
//!
//! ## File Format
//!
//! ```toml
//! addr = "0.0.0.0:9000"
//! pool_capacity = 256
//! ```
//!
//! Missing keys keep their defaults; unknown keys are rejected.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const ENV_ADDR: &str = "CHAINR_ADDR";
pub const ENV_POOL_CAPACITY: &str = "CHAINR_POOL_CAPACITY";
pub const ENV_MAX_BODY_BYTES: &str = "CHAINR_MAX_BODY_BYTES";
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "CHAINR_SHUTDOWN_TIMEOUT_SECS";

/// Configuration loading error
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// An environment variable held a value that does not parse
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config file {}: {source}", path.display())
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Runtime configuration for the HTTP server and dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Listen address, `host:port`
    pub addr: String,
    /// Idle request contexts kept for reuse
    pub pool_capacity: usize,
    /// Largest accepted request body; bigger bodies get 413
    pub max_body_bytes: usize,
    /// Time allowed for in-flight connections to finish on shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            pool_capacity: crate::dispatcher::DEFAULT_POOL_CAPACITY,
            max_body_bytes: 1024 * 1024,
            shutdown_timeout_secs: 5,
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load a TOML file
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CHAINR_*` environment overrides
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a variable that does not parse.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a value that does not parse.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        fn invalid(key: &'static str, value: String) -> ConfigError {
            ConfigError::InvalidValue { key, value }
        }

        if let Some(addr) = lookup(ENV_ADDR) {
            self.addr = addr;
        }
        if let Some(val) = lookup(ENV_POOL_CAPACITY) {
            self.pool_capacity = val
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_POOL_CAPACITY, val.clone()))?;
        }
        if let Some(val) = lookup(ENV_MAX_BODY_BYTES) {
            self.max_body_bytes =
                parse_size(val.trim()).ok_or_else(|| invalid(ENV_MAX_BODY_BYTES, val.clone()))?;
        }
        if let Some(val) = lookup(ENV_SHUTDOWN_TIMEOUT_SECS) {
            self.shutdown_timeout_secs = val
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_SHUTDOWN_TIMEOUT_SECS, val.clone()))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.addr, "127.0.0.1:8080");
        assert_eq!(config.pool_capacity, 1024);
        assert_eq!(config.max_body_bytes, 1 << 20);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_apply_vars() {
        let mut config = RuntimeConfig::default();
        config
            .apply_vars(vars(&[
                (ENV_ADDR, "0.0.0.0:9000"),
                (ENV_POOL_CAPACITY, "16"),
                (ENV_MAX_BODY_BYTES, "0x400"),
                (ENV_SHUTDOWN_TIMEOUT_SECS, "1"),
            ]))
            .unwrap();
        assert_eq!(config.addr, "0.0.0.0:9000");
        assert_eq!(config.pool_capacity, 16);
        assert_eq!(config.max_body_bytes, 1024);
        assert_eq!(config.shutdown_timeout_secs, 1);
    }

    #[test]
    fn test_apply_vars_rejects_garbage() {
        let mut config = RuntimeConfig::default();
        let err = config
            .apply_vars(vars(&[(ENV_POOL_CAPACITY, "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_POOL_CAPACITY,
                ..
            }
        ));
        assert_eq!(err.to_string(), "invalid value 'lots' for CHAINR_POOL_CAPACITY");
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "addr = \"127.0.0.1:0\"\npool_capacity = 8").unwrap();
        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.addr, "127.0.0.1:0");
        assert_eq!(config.pool_capacity, 8);
        assert_eq!(config.max_body_bytes, 1 << 20);
    }

    #[test]
    fn test_from_file_errors() {
        let err = RuntimeConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "unknown_key = 1").unwrap();
        let err = RuntimeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
