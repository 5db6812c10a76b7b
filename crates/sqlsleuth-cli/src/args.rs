//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "sqlsleuth")]
#[command(author, version, about = "Detect hallucinated SQL identifiers against a schema")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check SQL files against a schema snapshot
    Check {
        /// SQL files to check (supports glob patterns)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Schema definition files (CREATE TABLE DDL)
        #[arg(short, long = "schema", value_name = "FILE")]
        schema: Vec<PathBuf>,

        /// SQL dialect
        #[arg(short, long, default_value = "sqlite")]
        dialect: String,

        /// Output format
        #[arg(short, long, default_value = "human", value_enum)]
        format: OutputFormat,

        /// Treat unresolvable columns as errors, not just findings
        #[arg(long = "strict-columns")]
        strict_columns: bool,
    },

    /// Display schema snapshot information
    Schema {
        /// Schema definition files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// SQL dialect
        #[arg(short, long, default_value = "sqlite")]
        dialect: String,
    },

    /// List registered dialects and their capabilities
    Dialects,

    /// Parse SQL and display the AST (for debugging)
    Parse {
        /// SQL file to parse
        file: PathBuf,

        /// SQL dialect
        #[arg(short, long, default_value = "sqlite")]
        dialect: String,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
}
