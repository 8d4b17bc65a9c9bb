//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use biblio_core::locator::{LocatorConfig, DEFAULT_FILE_HOST_BASE_URL, DEFAULT_MIN_BARE_ID_LEN};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Absent means the remote store is unavailable for this process.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub local_store_dir: PathBuf,
    pub file_host_base_url: String,
    pub bare_id_min_len: usize,
    pub probe_timeout: Duration,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let local_store_dir = lookup("LOCAL_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.biblio-local"));

        // --- Locator Settings ---
        let file_host_base_url = lookup("FILE_HOST_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_FILE_HOST_BASE_URL.to_string());

        let bare_id_min_len = match lookup("BARE_ID_MIN_LEN") {
            Some(raw) => raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BARE_ID_MIN_LEN".to_string(),
                    format!("'{}' is not a positive integer", raw),
                )
            })?,
            None => DEFAULT_MIN_BARE_ID_LEN,
        };

        let probe_timeout_secs = match lookup("PROBE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("PROBE_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => 5,
        };

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            local_store_dir,
            file_host_base_url,
            bare_id_min_len,
            probe_timeout: Duration::from_secs(probe_timeout_secs),
            allowed_origin,
        })
    }

    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            base_url: self.file_host_base_url.clone(),
            min_bare_id_len: self.bare_id_min_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.bare_id_min_len, 25);
        assert_eq!(config.file_host_base_url, "https://drive.google.com");
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/biblio"),
            ("FILE_HOST_BASE_URL", "http://files.local/"),
            ("BARE_ID_MIN_LEN", "12"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/biblio"));
        assert_eq!(config.locator_config().base_url, "http://files.local");
        assert_eq!(config.locator_config().min_bare_id_len, 12);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("BARE_ID_MIN_LEN", "zero")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "BARE_ID_MIN_LEN"
        ));
        assert!(matches!(
            config_from(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "BIND_ADDRESS"
        ));
    }
}
