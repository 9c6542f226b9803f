//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "sqlbind")]
#[command(
    author,
    version,
    about = "Infer result columns and bound parameters of SQL queries"
)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze query files against schema definitions
    Analyze {
        /// Query files to analyze (supports glob patterns)
        files: Vec<PathBuf>,

        /// Schema definition files
        #[arg(short, long = "schema", value_name = "FILE")]
        schema: Vec<PathBuf>,

        /// Directory containing schema files
        #[arg(long = "schema-dir", value_name = "DIR")]
        schema_dir: Option<PathBuf>,

        /// SQL dialect (sqlite, postgresql, mysql)
        #[arg(short, long, env = "SQLBIND_DIALECT")]
        dialect: Option<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Configuration file (defaults to the nearest sqlbind.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Diagnostic codes to suppress (e.g. E0002)
        #[arg(long, value_name = "CODE")]
        disable: Vec<String>,
    },

    /// Display the tables a schema defines
    Schema {
        /// Schema definition files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// SQL dialect (sqlite, postgresql, mysql)
        #[arg(short, long, default_value = "sqlite")]
        dialect: String,
    },

    /// Parse SQL and display AST (for debugging)
    Parse {
        /// SQL file to parse
        file: PathBuf,

        /// SQL dialect (sqlite, postgresql, mysql)
        #[arg(short, long, default_value = "sqlite")]
        dialect: String,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// SARIF output (for GitHub Code Scanning)
    Sarif,
}

impl Args {
    /// Log level requested by -v / -q
    pub fn log_directive(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_arguments() {
        let args = Args::try_parse_from([
            "sqlbind",
            "analyze",
            "queries/users.sql",
            "--schema",
            "schema.sql",
            "--format",
            "json",
            "--disable",
            "E0002",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.verbose, 1);
        assert_eq!(args.log_directive(), tracing::Level::DEBUG);
        match args.command {
            Command::Analyze {
                files,
                schema,
                format,
                disable,
                ..
            } => {
                assert_eq!(files, vec![PathBuf::from("queries/users.sql")]);
                assert_eq!(schema, vec![PathBuf::from("schema.sql")]);
                assert_eq!(format, Some(OutputFormat::Json));
                assert_eq!(disable, vec!["E0002".to_string()]);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = Args::try_parse_from(["sqlbind", "-q", "-vv", "parse", "q.sql"]).unwrap();
        assert_eq!(args.log_directive(), tracing::Level::ERROR);
    }
}
