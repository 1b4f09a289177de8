//! Application configuration
//!
//! Loaded from a TOML file. Every section and field has a default, so a
//! partial (or missing) file is fine.
//!
//! ```toml
//! [server]
//! api_host = "0.0.0.0"
//! api_port = 8080
//!
//! [database]
//! backend = "sqlite"
//! path = "/var/lib/parking-service/parking.db"
//!
//! [booking]
//! max_attempts = 32
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::errors::InfraError;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "PARKING_CONFIG";

/// Default config file: `<config_dir>/parking-service/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parking-service")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub booking: BookingSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub backend: StorageBackend,
    /// SQLite file, used when `url` is not set
    pub path: String,
    /// Full connection URL, takes precedence over `path`
    pub url: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: "./parking.db".to_string(),
            url: None,
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. "info" or "parking_service=debug"
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    /// Lost conditional-update races tolerated per booking
    pub max_attempts: u32,
    /// Attempts for a release hitting transient storage errors
    pub release_retry_attempts: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            max_attempts: 32,
            release_retry_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub username: String,
    pub email: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@parking.local".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| InfraError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.server.api_port == 0 {
            return Err(InfraError::Config("server.api_port must be non-zero".into()));
        }
        if self.booking.max_attempts == 0 {
            return Err(InfraError::Config(
                "booking.max_attempts must be at least 1".into(),
            ));
        }
        if self.database.backend == StorageBackend::Sqlite
            && self.database.url.is_none()
            && self.database.path.trim().is_empty()
        {
            return Err(InfraError::Config(
                "database.path is required for the sqlite backend".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            api_port = 9090

            [database]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.api_port, 9090);
        assert_eq!(config.server.api_host, "0.0.0.0");
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert_eq!(config.booking.max_attempts, 32);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = AppConfig::from_toml("[booking]\nmax_attempts = 0\n").unwrap_err();
        assert!(matches!(err, InfraError::Config(_)));
    }

    #[test]
    fn url_overrides_path() {
        let mut db = DatabaseSettings::default();
        assert_eq!(db.connection_url(), "sqlite://./parking.db?mode=rwc");
        db.url = Some("sqlite::memory:".into());
        assert_eq!(db.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/parking/config.toml")).unwrap();
        assert_eq!(config.server.api_port, 8080);
    }
}
