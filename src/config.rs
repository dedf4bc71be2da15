//! Configuration module for the file upload service.

use serde::Deserialize;
use std::path::Path;

use chrono_tz::Tz;

use crate::{FileUploadError, Result};

/// Environment variable that overrides `storage.root`.
pub const STORAGE_ROOT_ENV: &str = "FILEUPLOAD_STORAGE_ROOT";

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the Web API.
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory under which every upload directory is created.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Timezone used for the upload date (e.g., "Asia/Tokyo", "UTC").
    ///
    /// When unset, the server's local time is used.
    #[serde(default)]
    pub timezone: Option<String>,
    /// Skip directories without metadata records instead of aborting the scan.
    #[serde(default)]
    pub skip_empty_directories: bool,
}

fn default_storage_root() -> String {
    "file_storage".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size_mb: default_max_upload_size(),
            timezone: None,
            skip_empty_directories: false,
        }
    }
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/fileupload.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Upload storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FileUploadError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FileUploadError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEUPLOAD_STORAGE_ROOT`: Override the storage root directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var(STORAGE_ROOT_ENV) {
            if !root.is_empty() {
                self.storage.root = root;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the storage root is empty
    /// - the upload size limit is zero
    /// - the timezone is not a known IANA name
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.trim().is_empty() {
            return Err(FileUploadError::Config(
                "storage.root must not be empty".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(FileUploadError::Config(
                "storage.max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        if let Some(tz) = &self.storage.timezone {
            tz.parse::<Tz>().map_err(|_| {
                FileUploadError::Config(format!("unknown timezone in storage.timezone: {tz}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 8080);

        assert_eq!(config.storage.root, "file_storage");
        assert_eq!(config.storage.max_upload_size_mb, 10);
        assert!(config.storage.timezone.is_none());
        assert!(!config.storage.skip_empty_directories);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/fileupload.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[web]
host = "127.0.0.1"
port = 3000

[storage]
root = "/var/lib/uploads"
max_upload_size_mb = 20
timezone = "UTC"
skip_empty_directories = true

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 3000);

        assert_eq!(config.storage.root, "/var/lib/uploads");
        assert_eq!(config.storage.max_upload_size_mb, 20);
        assert_eq!(config.storage.timezone.as_deref(), Some("UTC"));
        assert!(config.storage.skip_empty_directories);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[storage]
root = "uploads"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.storage.root, "uploads");
        assert_eq!(config.storage.max_upload_size_mb, 10);
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.storage.root, "file_storage");
    }

    #[test]
    fn test_parse_invalid_config() {
        let toml = "this is not valid toml [[[";
        let result = Config::parse(toml);

        assert!(result.is_err());
        if let Err(FileUploadError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(matches!(result, Err(FileUploadError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides_storage_root() {
        let original = std::env::var(STORAGE_ROOT_ENV).ok();

        std::env::set_var(STORAGE_ROOT_ENV, "/tmp/env-storage");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.storage.root, "/tmp/env-storage");

        std::env::set_var(STORAGE_ROOT_ENV, "");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.storage.root, "file_storage");

        if let Some(val) = original {
            std::env::set_var(STORAGE_ROOT_ENV, val);
        } else {
            std::env::remove_var(STORAGE_ROOT_ENV);
        }
    }

    #[test]
    fn test_max_upload_size_bytes() {
        let storage = StorageConfig {
            max_upload_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(storage.max_upload_size_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_timezone() {
        let mut config = Config::default();
        config.storage.timezone = Some("Invalid/Zone".to_string());

        let result = config.validate();
        if let Err(FileUploadError::Config(msg)) = result {
            assert!(msg.contains("Invalid/Zone"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_validate_zero_upload_limit() {
        let mut config = Config::default();
        config.storage.max_upload_size_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_root() {
        let mut config = Config::default();
        config.storage.root = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
