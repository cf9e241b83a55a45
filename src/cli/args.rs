//! CLI argument definitions using clap
//!
//! Commands:
//! - schemacast normalize --schema <path>
//! - schemacast coerce --schema <path> [--config <path>] [--static-by-default]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// schemacast - coerce JSON documents to a declared schema
#[derive(Parser, Debug)]
#[command(name = "schemacast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the canonical form of a schema description
    Normalize {
        /// Path to the schema description (JSON)
        #[arg(long)]
        schema: PathBuf,
    },

    /// Coerce JSON documents read line by line from stdin
    Coerce {
        /// Path to the schema description (JSON)
        #[arg(long)]
        schema: PathBuf,

        /// Path to a coercion config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Coerce fields once instead of installing live accessors
        #[arg(long)]
        static_by_default: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Config file named on the command line, if any
    pub fn config_path(&self) -> Option<&PathBuf> {
        match &self.command {
            Command::Coerce { config, .. } => config.as_ref(),
            Command::Normalize { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coerce() {
        let cli = Cli::try_parse_from([
            "schemacast",
            "coerce",
            "--schema",
            "person.json",
            "--config",
            "cast.json",
            "--static-by-default",
        ])
        .unwrap();

        match &cli.command {
            Command::Coerce {
                schema,
                static_by_default,
                ..
            } => {
                assert_eq!(schema, &PathBuf::from("person.json"));
                assert!(*static_by_default);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config_path(), Some(&PathBuf::from("cast.json")));
    }

    #[test]
    fn test_parse_normalize_with_global_log_level() {
        let cli = Cli::try_parse_from(["schemacast", "normalize", "--schema", "s.json", "--log-level", "debug"])
            .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.config_path().is_none());
    }

    #[test]
    fn test_schema_is_required() {
        assert!(Cli::try_parse_from(["schemacast", "normalize"]).is_err());
    }
}
