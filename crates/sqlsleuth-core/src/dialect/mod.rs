//! SQL dialect registry
//!
//! Static catalogue of supported dialects. Every dialect the parser
//! recognizes has a [`SqlDialect`] variant; only fully described dialects
//! carry a [`DialectDescriptor`] (builtin-function vocabulary plus
//! capability flags). Dialects without a descriptor are still usable as a
//! parse hint.

mod builtins;

use std::str::FromStr;

use sqlparser::dialect::{
    BigQueryDialect, Dialect, DuckDbDialect, GenericDialect, MySqlDialect, PostgreSqlDialect,
    SQLiteDialect, SnowflakeDialect,
};

use crate::error::{Error, Result};

use builtins::SQLITE_FUNCTIONS;

/// SQL dialects the parser recognizes by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SqlDialect {
    #[default]
    Sqlite,
    Postgres,
    DuckDb,
    BigQuery,
    Snowflake,
    MySql,
    /// Permissive catch-all syntax, used as the last parse fallback.
    Generic,
}

impl SqlDialect {
    /// All named dialects, in registry order. Excludes [`SqlDialect::Generic`].
    pub fn all() -> &'static [SqlDialect] {
        &[
            SqlDialect::Sqlite,
            SqlDialect::Postgres,
            SqlDialect::DuckDb,
            SqlDialect::BigQuery,
            SqlDialect::Snowflake,
            SqlDialect::MySql,
        ]
    }

    /// Get the sqlparser dialect for parsing
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::DuckDb => Box::new(DuckDbDialect {}),
            SqlDialect::BigQuery => Box::new(BigQueryDialect {}),
            SqlDialect::Snowflake => Box::new(SnowflakeDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::Generic => Box::new(GenericDialect {}),
        }
    }

    /// The full description for this dialect, if one is registered.
    ///
    /// Returns `None` for dialects the parser recognizes only by name.
    pub fn descriptor(&self) -> Option<&'static DialectDescriptor> {
        match self {
            SqlDialect::Sqlite => Some(&SQLITE_DESCRIPTOR),
            _ => None,
        }
    }
}

impl FromStr for SqlDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(SqlDialect::Sqlite),
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::Postgres),
            "duckdb" => Ok(SqlDialect::DuckDb),
            "bigquery" => Ok(SqlDialect::BigQuery),
            "snowflake" => Ok(SqlDialect::Snowflake),
            "mysql" | "mysql8" => Ok(SqlDialect::MySql),
            "generic" => Ok(SqlDialect::Generic),
            _ => Err(Error::unsupported_dialect(s)),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::Postgres => "postgres",
            SqlDialect::DuckDb => "duckdb",
            SqlDialect::BigQuery => "bigquery",
            SqlDialect::Snowflake => "snowflake",
            SqlDialect::MySql => "mysql",
            SqlDialect::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

/// Full description of one dialect: capability flags plus the builtin
/// function vocabulary used by the validator's builtin exemption.
#[derive(Debug)]
pub struct DialectDescriptor {
    pub dialect: SqlDialect,
    pub default_schema: Option<&'static str>,
    pub supports_schemas: bool,
    pub supports_cte: bool,
    pub supports_window_functions: bool,
    pub supports_json: bool,
    pub supports_arrays: bool,
    pub description: &'static str,
    builtin_functions: &'static [&'static str],
}

impl DialectDescriptor {
    /// Case-insensitive membership test against the builtin vocabulary.
    pub fn is_builtin_function(&self, name: &str) -> bool {
        self.builtin_functions
            .iter()
            .any(|f| f.eq_ignore_ascii_case(name))
    }

    pub fn builtin_functions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtin_functions.iter().copied()
    }

    pub fn builtin_function_count(&self) -> usize {
        self.builtin_functions.len()
    }
}

static SQLITE_DESCRIPTOR: DialectDescriptor = DialectDescriptor {
    dialect: SqlDialect::Sqlite,
    default_schema: None,
    supports_schemas: false,
    supports_cte: true,
    supports_window_functions: true,
    supports_json: true,
    supports_arrays: false,
    description: "SQLite - Lightweight embedded database",
    builtin_functions: SQLITE_FUNCTIONS,
};

/// Look up the descriptor for a dialect by name.
///
/// Fails with [`Error::UnsupportedDialect`] when the name is unknown or the
/// dialect is recognized but carries no registered description.
pub fn describe(name: &str) -> Result<&'static DialectDescriptor> {
    let dialect: SqlDialect = name.parse()?;
    dialect
        .descriptor()
        .ok_or_else(|| Error::unsupported_dialect(name))
}

/// Names of the fully described dialects, in registry order.
pub fn list_supported() -> Vec<&'static str> {
    let mut names = Vec::new();
    for dialect in SqlDialect::all() {
        if dialect.descriptor().is_some() {
            names.push(match dialect {
                SqlDialect::Sqlite => "sqlite",
                SqlDialect::Postgres => "postgres",
                SqlDialect::DuckDb => "duckdb",
                SqlDialect::BigQuery => "bigquery",
                SqlDialect::Snowflake => "snowflake",
                SqlDialect::MySql => "mysql",
                SqlDialect::Generic => "generic",
            });
        }
    }
    names
}
