//! sqlsleuth CLI - detects hallucinated SQL identifiers against a schema

mod args;
mod config;
mod output;

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use sqlsleuth_core::schema::SnapshotBuilder;
use sqlsleuth_core::validator::ColumnCheckMode;
use sqlsleuth_core::{HallucinationDetector, MultiDialectParser, SqlDialect};

use crate::args::{Args, Command, OutputFormat};
use crate::config::Config;
use crate::output::OutputFormatter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Check {
            files,
            schema,
            dialect,
            format,
            strict_columns,
        } => {
            let dialect: SqlDialect = dialect
                .parse()
                .map_err(|e: sqlsleuth_core::Error| miette::miette!("{e}"))?;

            let config = Config::find_and_load()?.unwrap_or_default();
            let config = config.merge_with_args(&schema, &files, &Some(format), strict_columns);

            let schema_files = expand_patterns(&config.schema)?;
            if schema_files.is_empty() {
                miette::bail!(
                    "No schema files specified. Use --schema or configure in sqlsleuth.toml"
                );
            }

            let output_format = match config.format.as_deref() {
                Some("json") => OutputFormat::Json,
                _ => OutputFormat::Human,
            };

            // Build the schema snapshot from DDL
            let mut builder = SnapshotBuilder::with_dialect(dialect);
            for schema_file in &schema_files {
                let content = fs::read_to_string(schema_file).into_diagnostic()?;
                builder
                    .parse(&content)
                    .map_err(|e| miette::miette!("{}: {e}", schema_file.display()))?;
            }
            let snapshot = builder.build();

            let query_files = expand_patterns(&config.files)?;
            if query_files.is_empty() {
                miette::bail!(
                    "No query files specified. Use positional arguments or configure in sqlsleuth.toml"
                );
            }

            let column_mode = if config.strict_columns {
                ColumnCheckMode::Strict
            } else {
                ColumnCheckMode::Lenient
            };
            let detector = HallucinationDetector::new(dialect).with_column_mode(column_mode);

            let mut total_errors = 0;
            let mut total_warnings = 0;

            for query_file in &query_files {
                let content = fs::read_to_string(query_file).into_diagnostic()?;
                let report = detector.detect(&content, &snapshot);

                if report.has_findings() {
                    let formatter =
                        OutputFormatter::new(output_format, query_file.display().to_string());
                    formatter.print_report(&report);

                    total_errors += report.errors.len();
                    total_warnings += report.warnings.len();
                }
            }

            if total_errors > 0 || total_warnings > 0 {
                eprintln!(
                    "Found {} error(s), {} warning(s) in {} file(s)",
                    total_errors,
                    total_warnings,
                    query_files.len()
                );
            } else {
                eprintln!("All {} file(s) passed validation", query_files.len());
            }

            Ok(total_errors > 0)
        }

        Command::Schema { files, dialect } => {
            let dialect: SqlDialect = dialect
                .parse()
                .map_err(|e: sqlsleuth_core::Error| miette::miette!("{e}"))?;

            let mut builder = SnapshotBuilder::with_dialect(dialect);
            for schema_file in &files {
                let content = fs::read_to_string(schema_file).into_diagnostic()?;
                builder
                    .parse(&content)
                    .map_err(|e| miette::miette!("{}: {e}", schema_file.display()))?;
            }
            let snapshot = builder.build();

            println!("Schema Snapshot ({})", snapshot.dialect);
            println!("=====================");
            for (table_name, table) in &snapshot.tables {
                println!("\nTable: {}", table_name);
                for (col_name, col) in &table.columns {
                    let nullable = if col.nullable { "NULL" } else { "NOT NULL" };
                    let mut extras = Vec::new();
                    if col.is_primary_key {
                        extras.push("PRIMARY KEY".to_string());
                    }
                    if let Some(fk) = &col.foreign_key {
                        extras.push(format!("REFERENCES {}", fk));
                    }
                    let extras = if extras.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", extras.join(", "))
                    };
                    println!(
                        "  - {} {} {}{}",
                        col_name, col.declared_type, nullable, extras
                    );
                }
            }

            Ok(false)
        }

        Command::Dialects => {
            println!("Registered dialects:");
            for dialect in SqlDialect::all() {
                match dialect.descriptor() {
                    Some(desc) => {
                        println!("\n{} - {}", dialect, desc.description);
                        println!("  builtin functions: {}", desc.builtin_function_count());
                        let mut caps = Vec::new();
                        if desc.supports_schemas {
                            caps.push("schemas");
                        }
                        if desc.supports_cte {
                            caps.push("CTEs");
                        }
                        if desc.supports_window_functions {
                            caps.push("window functions");
                        }
                        if desc.supports_json {
                            caps.push("JSON");
                        }
                        if desc.supports_arrays {
                            caps.push("arrays");
                        }
                        println!("  capabilities: {}", caps.join(", "));
                    }
                    None => {
                        println!("\n{} - parse hint only (no registered description)", dialect);
                    }
                }
            }

            Ok(false)
        }

        Command::Parse { file, dialect } => {
            let content = fs::read_to_string(&file).into_diagnostic()?;

            let parser = MultiDialectParser::default();
            let parsed = parser.parse(&content, &dialect);

            match &parsed.ast {
                Some(stmt) => {
                    println!("Dialect: {}", parsed.dialect_used);
                    println!("{:#?}", stmt);
                    Ok(false)
                }
                None => {
                    eprintln!(
                        "Parse error: {}",
                        parsed.parse_error.as_deref().unwrap_or("unknown")
                    );
                    Ok(true)
                }
            }
        }
    }
}

/// Expand paths and glob patterns into a concrete file list
fn expand_patterns(patterns: &[String]) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if pattern.contains('*') {
            for path in glob::glob(pattern).into_diagnostic()?.flatten() {
                files.push(path);
            }
        } else {
            files.push(std::path::PathBuf::from(pattern));
        }
    }
    Ok(files)
}
