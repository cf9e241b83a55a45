//! CLI module for schemacast
//!
//! Provides command-line interface for:
//! - normalize: Print the canonical form of a schema description
//! - coerce: Coerce JSON documents from stdin against a schema

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{coerce, coerce_document, coerce_stream, normalize, run_command};
pub use config::CoerceConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, rejection_to_json, write_error, write_response};

use crate::observability::logger;

/// Parses arguments, installs logging and runs the command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let config = match cli.config_path() {
        Some(path) => CoerceConfig::load(path)?,
        None => CoerceConfig::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    if !logger::is_valid_level(level) {
        return Err(CliError::config_error(format!("Invalid log level: '{}'", level)));
    }
    logger::init(level, config.log_format_kind().unwrap_or_default());

    run_command(cli.command, &config)
}
