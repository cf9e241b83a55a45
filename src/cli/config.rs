//! Coercion config file
//!
//! Every key is optional:
//!
//! ```json
//! { "static_by_default": false, "report_invalid": true, "log_level": "warn", "log_format": "text" }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::logger::{is_valid_level, LogFormat};
use crate::observability::LOG_LEVELS;
use crate::schema::Options;

use super::errors::{CliError, CliResult};

/// Settings for the `coerce` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoerceConfig {
    /// Coerce fields once instead of installing live accessors
    #[serde(default)]
    pub static_by_default: bool,

    /// List rejected values next to each coerced document
    #[serde(default = "default_report_invalid")]
    pub report_invalid: bool,

    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_report_invalid() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for CoerceConfig {
    fn default() -> Self {
        Self {
            static_by_default: false,
            report_invalid: default_report_invalid(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl CoerceConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: CoerceConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if !is_valid_level(&self.log_level) {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if self.log_format_kind().is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_format: '{}'. Expected 'text' or 'json'",
                self.log_format
            )));
        }

        Ok(())
    }

    pub fn log_format_kind(&self) -> Option<LogFormat> {
        match self.log_format.as_str() {
            "text" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }

    /// Engine options for this config. The rejection observer is attached per
    /// document by the command.
    pub fn to_options(&self) -> Options {
        Options::new().static_by_default(self.static_by_default)
    }
}

impl From<&CoerceConfig> for Options {
    fn from(config: &CoerceConfig) -> Self {
        config.to_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("schemacast.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_apply() {
        let dir = TempDir::new().unwrap();
        let config = CoerceConfig::load(&write_config(&dir, "{}")).unwrap();
        assert_eq!(config, CoerceConfig::default());
        assert!(config.report_invalid);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_static_flag_reaches_options() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"static_by_default": true, "log_format": "json"}"#);
        let config = CoerceConfig::load(&path).unwrap();
        assert!(Options::from(&config).is_static_by_default());
        assert_eq!(config.log_format_kind(), Some(LogFormat::Json));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let dir = TempDir::new().unwrap();
        let err = CoerceConfig::load(&write_config(&dir, r#"{"log_level": "loud"}"#)).unwrap_err();
        assert_eq!(err.code_str(), "SCHEMACAST_CLI_CONFIG_ERROR");
        assert!(err.message().contains("loud"));
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(CoerceConfig::load(&write_config(&dir, r#"{"log_format": "xml"}"#)).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = CoerceConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.message().contains("Failed to read config"));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let err = CoerceConfig::load(&write_config(&dir, "{")).unwrap_err();
        assert!(err.message().contains("Invalid config JSON"));
    }
}
