//! In-memory snapshot of a database schema.
//!
//! A [`SchemaSnapshot`] is the ground truth the validator checks identifier
//! references against. It is built once (from introspection or DDL) and then
//! treated as read-only; the core never mutates it after construction.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single column of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as written in the schema (e.g. "INTEGER", "VARCHAR(45)")
    pub declared_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Referenced target as "table.column" when this column is a foreign key
    pub foreign_key: Option<String>,
    pub default_value: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            nullable: true,
            is_primary_key: false,
            foreign_key: None,
            default_value: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn references(mut self, target: impl Into<String>) -> Self {
        self.foreign_key = Some(target.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }
}

/// A table and its columns. Column names are unique within a table and keep
/// declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: IndexMap<String, ColumnInfo>,
    pub row_count: Option<u64>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            row_count: None,
        }
    }

    pub fn with_row_count(mut self, count: u64) -> Self {
        self.row_count = Some(count);
        self
    }

    pub fn add_column(&mut self, column: ColumnInfo) {
        self.columns.insert(column.name.clone(), column);
    }

    /// Get a column by name (case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn column_exists(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }
}

/// Point-in-time description of one database: its dialect, an identifier for
/// the database itself, and every user table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub dialect: String,
    pub database: String,
    pub tables: IndexMap<String, TableInfo>,
}

impl SchemaSnapshot {
    pub fn new(dialect: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            database: database.into(),
            tables: IndexMap::new(),
        }
    }

    pub fn add_table(&mut self, table: TableInfo) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Get a table by name (case-insensitive)
    pub fn get_table(&self, name: &str) -> Option<&TableInfo> {
        self.tables
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.get_table(name).is_some()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}
