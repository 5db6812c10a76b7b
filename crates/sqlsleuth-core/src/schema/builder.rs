//! Snapshot builder - constructs a SchemaSnapshot from CREATE TABLE DDL
//!
//! Stand-in for live schema introspection: feeding the schema's DDL through
//! this builder yields the same snapshot an introspection pass would.

use sqlparser::ast::{ColumnOption, ObjectName, Statement, TableConstraint};
use sqlparser::parser::Parser;
use tracing::debug;

use crate::dialect::SqlDialect;
use crate::error::{Error, Result};
use crate::schema::{ColumnInfo, SchemaSnapshot, TableInfo};

/// Builder for constructing a [`SchemaSnapshot`] from SQL schema definitions
pub struct SnapshotBuilder {
    dialect: SqlDialect,
    snapshot: SchemaSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::with_dialect(SqlDialect::default())
    }

    pub fn with_dialect(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            snapshot: SchemaSnapshot::new(dialect.to_string(), "ddl"),
        }
    }

    /// Name the database the snapshot describes (defaults to "ddl")
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.snapshot.database = name.into();
        self
    }

    /// Parse SQL schema definitions and add their tables to the snapshot.
    ///
    /// Tries the whole input first; if that fails, statements are parsed
    /// individually so unsupported syntax (triggers, pragmas, and the like)
    /// is skipped without losing the tables around it. Fails only when
    /// nothing in a non-empty input could be parsed.
    pub fn parse(&mut self, sql: &str) -> Result<()> {
        let parser_dialect = self.dialect.parser_dialect();

        match Parser::parse_sql(parser_dialect.as_ref(), sql) {
            Ok(statements) => {
                for stmt in statements {
                    self.process_statement(&stmt);
                }
                Ok(())
            }
            Err(first_error) => {
                let mut parsed_any = false;
                let mut saw_any = false;

                for raw_stmt in split_sql_statements(sql) {
                    let trimmed = raw_stmt.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    saw_any = true;

                    match Parser::parse_sql(parser_dialect.as_ref(), trimmed) {
                        Ok(stmts) => {
                            parsed_any = true;
                            for stmt in stmts {
                                self.process_statement(&stmt);
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "skipping unparseable schema statement");
                        }
                    }
                }

                if saw_any && !parsed_any {
                    Err(Error::ParseFailure(first_error.to_string()))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Process a single SQL statement
    fn process_statement(&mut self, stmt: &Statement) {
        if let Statement::CreateTable(create) = stmt {
            self.process_create_table(create);
        }
    }

    /// Process CREATE TABLE statement
    fn process_create_table(&mut self, create: &sqlparser::ast::CreateTable) {
        let name = object_name_to_table_name(&create.name);
        let mut table = TableInfo::new(name);

        for column in &create.columns {
            let mut info = ColumnInfo::new(&column.name.value, column.data_type.to_string());

            for option in &column.options {
                match &option.option {
                    ColumnOption::Null => info.nullable = true,
                    ColumnOption::NotNull => info.nullable = false,
                    ColumnOption::Default(expr) => {
                        info.default_value = Some(expr.to_string());
                    }
                    ColumnOption::Unique { is_primary, .. } => {
                        if *is_primary {
                            info.is_primary_key = true;
                            info.nullable = false;
                        }
                    }
                    ColumnOption::ForeignKey {
                        foreign_table,
                        referred_columns,
                        ..
                    } => {
                        info.foreign_key =
                            Some(foreign_key_target(foreign_table, referred_columns));
                    }
                    _ => {}
                }
            }

            table.add_column(info);
        }

        for constraint in &create.constraints {
            self.process_table_constraint(&mut table, constraint);
        }

        self.snapshot.add_table(table);
    }

    /// Process a table-level constraint (PRIMARY KEY, FOREIGN KEY)
    fn process_table_constraint(&mut self, table: &mut TableInfo, constraint: &TableConstraint) {
        match constraint {
            TableConstraint::PrimaryKey { columns, .. } => {
                for col_ident in columns {
                    if let Some(col) = table.columns.get_mut(&col_ident.value) {
                        col.is_primary_key = true;
                        col.nullable = false;
                    }
                }
            }
            TableConstraint::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                let target = foreign_key_target(foreign_table, referred_columns);
                for col_ident in columns {
                    if let Some(col) = table.columns.get_mut(&col_ident.value) {
                        col.foreign_key = Some(target.clone());
                    }
                }
            }
            _ => {}
        }
    }

    /// Consume the builder and return the snapshot
    pub fn build(self) -> SchemaSnapshot {
        self.snapshot
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bare table name from a possibly qualified ObjectName
fn object_name_to_table_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Render a FK target as "table.column"
fn foreign_key_target(
    foreign_table: &ObjectName,
    referred_columns: &[sqlparser::ast::Ident],
) -> String {
    let table = object_name_to_table_name(foreign_table);
    match referred_columns.first() {
        Some(col) => format!("{}.{}", table, col.value),
        None => table,
    }
}

/// Split SQL text into individual statements by semicolons, respecting
/// single-quoted string literals and comments.
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\'' => {
                // Skip single-quoted string, honoring '' escapes
                i += 1;
                while i < len {
                    if bytes[i] == b'\'' {
                        i += 1;
                        if i < len && bytes[i] == b'\'' {
                            i += 1;
                        } else {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < len {
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                let stmt = &sql[start..i];
                if !stmt.trim().is_empty() {
                    statements.push(stmt);
                }
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let last = &sql[start..];
    if !last.trim().is_empty() {
        statements.push(last);
    }

    statements
}
