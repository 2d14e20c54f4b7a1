//! Configuration module
//!
//! Loading from TOML files and environment, with structured configuration
//! types and field-level defaults.

use serde::{Deserialize, Serialize};

use crate::errors::{CustodyError, CustodyResult};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Persisted account store
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Execution registry
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Path to the encrypted account records (JSON)
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Bound on each session close during shutdown cleanup, in seconds
    #[serde(default = "default_cleanup_timeout")]
    pub cleanup_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Port for the host application's metrics endpoint
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Enable tracing output
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file(path)
    }

    /// Validate invariants the type system cannot express
    pub fn validate(&self) -> CustodyResult<()> {
        if self.accounts.store_path.is_empty() {
            return Err(CustodyError::Configuration(
                "accounts.store_path must not be empty".to_string(),
            ));
        }
        if self.execution.cleanup_timeout_secs == 0 {
            return Err(CustodyError::Configuration(
                "execution.cleanup_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            cleanup_timeout_secs: default_cleanup_timeout(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
            metrics_port: default_metrics_port(),
            enable_tracing: default_true(),
        }
    }
}

fn default_store_path() -> String {
    "accounts.json".to_string()
}

fn default_cleanup_timeout() -> u64 {
    30
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.accounts.store_path, "accounts.json");
        assert_eq!(config.execution.cleanup_timeout_secs, 30);
        assert!(config.monitoring.enable_metrics);
        assert_eq!(config.monitoring.metrics_port, 9090);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "[accounts]\nstore_path = \"/var/lib/custody/accounts.json\"\n"
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.accounts.store_path, "/var/lib/custody/accounts.json");
        assert_eq!(config.execution.cleanup_timeout_secs, 30);
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = Config::default();
        config.execution.cleanup_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CustodyError::Configuration(_)));
    }

    #[test]
    fn test_validation_rejects_empty_store_path() {
        let mut config = Config::default();
        config.accounts.store_path = String::new();
        assert!(config.validate().is_err());
    }
}
