//! Log subscriber setup for the schemacast binary
//!
//! The library only emits `tracing` events. Binaries pick the output:
//! - Human-readable or JSON lines
//! - Always stderr, so stdout stays reserved for command output
//! - `RUST_LOG` overrides the configured level

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Log levels accepted in configuration
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if `level` is one of [`LOG_LEVELS`]
pub fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level)
}

/// Builds the filter: `RUST_LOG` if set, otherwise `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(default_level: &str, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}
