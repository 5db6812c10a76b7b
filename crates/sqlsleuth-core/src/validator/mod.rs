//! Hallucination detection - validating identifiers against a schema
//!
//! Compares an extracted [`IdentifierSet`] against a [`SchemaSnapshot`] and
//! reports references that cannot exist: phantom tables and phantom columns.
//! The checks are deliberately conservative. A reference is only flagged when
//! every legitimate explanation has been ruled out - alias bindings, CTE and
//! subquery scopes, SELECT-list aliases, and the dialect's builtin function
//! vocabulary all count as explanations. False negatives are acceptable;
//! false positives are not.

use serde::Serialize;
use tracing::debug;

use crate::dialect::{DialectDescriptor, SqlDialect};
use crate::extractor::{extract, AliasTarget, IdentifierSet};
use crate::parser::MultiDialectParser;
use crate::schema::SchemaSnapshot;

/// How strictly unresolvable columns are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnCheckMode {
    /// Phantom columns are errors.
    Strict,
    /// Phantom columns are reported but not counted as errors. The column
    /// heuristics cannot see through wildcards or dynamic scopes, so this is
    /// the default.
    #[default]
    Lenient,
}

/// Outcome of validating one statement against a schema.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Referenced tables that do not exist in the schema
    pub phantom_tables: Vec<String>,
    /// Column references that could not be resolved to any scope
    pub phantom_columns: Vec<String>,
    /// Non-fatal observations (ambiguous references, skipped statements)
    pub warnings: Vec<String>,
    /// Findings severe enough to fail the statement
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_findings(&self) -> bool {
        !self.phantom_tables.is_empty()
            || !self.phantom_columns.is_empty()
            || !self.warnings.is_empty()
            || !self.errors.is_empty()
    }
}

/// Detector for hallucinated schema references in SQL.
pub struct HallucinationDetector {
    dialect: SqlDialect,
    /// Builtin-function vocabulary used for the exemption check. Dialects
    /// without their own registered description borrow the SQLite vocabulary
    /// rather than flagging every builtin as a phantom column.
    descriptor: &'static DialectDescriptor,
    column_mode: ColumnCheckMode,
    parser: MultiDialectParser,
}

impl HallucinationDetector {
    pub fn new(dialect: SqlDialect) -> Self {
        let descriptor = dialect
            .descriptor()
            .or_else(|| SqlDialect::Sqlite.descriptor())
            .expect("sqlite descriptor is always registered");
        Self {
            dialect,
            descriptor,
            column_mode: ColumnCheckMode::default(),
            parser: MultiDialectParser::new(dialect),
        }
    }

    pub fn with_column_mode(mut self, mode: ColumnCheckMode) -> Self {
        self.column_mode = mode;
        self
    }

    /// Parse, extract, and validate in one call.
    pub fn detect(&self, sql: &str, schema: &SchemaSnapshot) -> ValidationReport {
        let parsed = self.parser.parse(sql, &self.dialect.to_string());

        if let Some(error) = &parsed.parse_error {
            let mut report = ValidationReport::default();
            report
                .errors
                .push(format!("SQL could not be parsed: {}", error));
            return report;
        }

        let mut report = self.validate(&extract(&parsed), schema);

        if !parsed.is_select() {
            report.warnings.push(format!(
                "only SELECT statements are analyzed; {} statement was not checked",
                parsed.statement_kind()
            ));
        }

        report
    }

    /// Validate an already-extracted identifier set against a schema.
    pub fn validate(&self, ids: &IdentifierSet, schema: &SchemaSnapshot) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_tables(ids, schema, &mut report);
        self.check_columns(ids, schema, &mut report);

        debug!(
            phantom_tables = report.phantom_tables.len(),
            phantom_columns = report.phantom_columns.len(),
            warnings = report.warnings.len(),
            "validation finished"
        );
        report
    }

    fn check_tables(
        &self,
        ids: &IdentifierSet,
        schema: &SchemaSnapshot,
        report: &mut ValidationReport,
    ) {
        for table_ref in &ids.tables {
            let bare = bare_name(table_ref);
            if schema.table_exists(bare) {
                continue;
            }

            // A "table" reference may actually name a CTE, a derived-table
            // alias, or a table alias reused in FROM position.
            match lookup_alias(ids, bare) {
                Some(AliasTarget::Cte) | Some(AliasTarget::Subquery) => continue,
                Some(AliasTarget::Table(underlying)) if schema.table_exists(underlying) => continue,
                _ => {}
            }

            report.phantom_tables.push(table_ref.clone());
            report
                .errors
                .push(format!("Table '{}' does not exist", table_ref));
        }
    }

    fn check_columns(
        &self,
        ids: &IdentifierSet,
        schema: &SchemaSnapshot,
        report: &mut ValidationReport,
    ) {
        // Real tables in scope for unqualified references.
        let scope_tables: Vec<&crate::schema::TableInfo> = ids
            .tables
            .iter()
            .filter_map(|t| schema.get_table(bare_name(t)))
            .collect();

        for column_ref in &ids.columns {
            let resolved = match column_ref.split_once('.') {
                Some((qualifier, column)) => {
                    self.resolve_qualified(ids, schema, qualifier, column)
                }
                None => self.resolve_unqualified(ids, &scope_tables, column_ref),
            };

            match resolved {
                Resolution::Found | Resolution::Unknowable => {}
                Resolution::Ambiguous(tables) => {
                    report.warnings.push(format!(
                        "Column '{}' is ambiguous; it exists in tables: {}",
                        column_ref,
                        tables.join(", ")
                    ));
                }
                Resolution::Phantom => {
                    report.phantom_columns.push(column_ref.clone());
                    if self.column_mode == ColumnCheckMode::Strict {
                        report
                            .errors
                            .push(format!("Column '{}' does not exist", column_ref));
                    }
                }
            }
        }
    }

    fn resolve_qualified(
        &self,
        ids: &IdentifierSet,
        schema: &SchemaSnapshot,
        qualifier: &str,
        column: &str,
    ) -> Resolution {
        // Alias binding wins over a table of the same name.
        if let Some(target) = lookup_alias(ids, qualifier) {
            return match target {
                AliasTarget::Table(underlying) => match schema.get_table(underlying) {
                    Some(table) if table.column_exists(column) => Resolution::Found,
                    Some(_) => self.builtin_or_phantom(column),
                    // The alias points at a phantom table, already reported.
                    None => Resolution::Unknowable,
                },
                AliasTarget::Cte | AliasTarget::Subquery => {
                    match ids.exported_columns.get(&qualifier.to_lowercase()) {
                        Some(exported) => {
                            if exported.contains(&column.to_lowercase()) {
                                Resolution::Found
                            } else {
                                self.builtin_or_phantom(column)
                            }
                        }
                        // Export set unknown (e.g. SELECT *): cannot judge.
                        None => Resolution::Unknowable,
                    }
                }
            };
        }

        if let Some(table) = schema.get_table(qualifier) {
            return if table.column_exists(column) {
                Resolution::Found
            } else {
                self.builtin_or_phantom(column)
            };
        }

        if let Some(exported) = ids.exported_columns.get(&qualifier.to_lowercase()) {
            return if exported.contains(&column.to_lowercase()) {
                Resolution::Found
            } else {
                self.builtin_or_phantom(column)
            };
        }

        // Unknown qualifier: the table check already covers phantom scopes.
        Resolution::Unknowable
    }

    fn resolve_unqualified(
        &self,
        ids: &IdentifierSet,
        scope_tables: &[&crate::schema::TableInfo],
        column: &str,
    ) -> Resolution {
        let mut hits: Vec<String> = Vec::new();
        for table in scope_tables {
            if table.column_exists(column) && !hits.iter().any(|t| t == &table.name) {
                hits.push(table.name.clone());
            }
        }
        match hits.len() {
            1 => return Resolution::Found,
            0 => {}
            _ => return Resolution::Ambiguous(hits),
        }

        let lowered = column.to_lowercase();
        if ids.select_aliases.contains(&lowered) {
            return Resolution::Found;
        }
        if ids
            .exported_columns
            .values()
            .any(|exported| exported.contains(&lowered))
        {
            return Resolution::Found;
        }

        self.builtin_or_phantom(column)
    }

    /// Last resort before flagging: bare builtins such as CURRENT_TIMESTAMP
    /// parse as plain identifiers and must not be reported as columns.
    fn builtin_or_phantom(&self, column: &str) -> Resolution {
        if self.descriptor.is_builtin_function(column) {
            Resolution::Found
        } else {
            Resolution::Phantom
        }
    }
}

enum Resolution {
    Found,
    Phantom,
    Ambiguous(Vec<String>),
    /// Not enough information to judge either way; never reported.
    Unknowable,
}

fn lookup_alias<'a>(ids: &'a IdentifierSet, name: &str) -> Option<&'a AliasTarget> {
    ids.aliases
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn bare_name(table_ref: &str) -> &str {
    table_ref.rsplit('.').next().unwrap_or(table_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnInfo, TableInfo};
    use pretty_assertions::assert_eq;

    fn case_schema() -> SchemaSnapshot {
        let mut schema = SchemaSnapshot::new("sqlite", "case_file");

        let mut suspects = TableInfo::new("suspects");
        suspects.add_column(ColumnInfo::new("id", "INTEGER").primary_key());
        suspects.add_column(ColumnInfo::new("name", "TEXT").not_null());
        suspects.add_column(ColumnInfo::new("occupation", "TEXT"));
        schema.add_table(suspects);

        let mut orders = TableInfo::new("orders");
        orders.add_column(ColumnInfo::new("id", "INTEGER").primary_key());
        orders.add_column(ColumnInfo::new("suspect_id", "INTEGER").references("suspects.id"));
        orders.add_column(ColumnInfo::new("amount", "REAL"));
        schema.add_table(orders);

        schema
    }

    fn detector() -> HallucinationDetector {
        HallucinationDetector::new(SqlDialect::Sqlite)
    }

    #[test]
    fn clean_query_produces_clean_report() {
        let report = detector().detect("SELECT name, occupation FROM suspects", &case_schema());
        assert!(report.is_clean());
        assert!(!report.has_findings());
    }

    #[test]
    fn phantom_table_is_an_error() {
        let report = detector().detect("SELECT * FROM shipments", &case_schema());
        assert_eq!(report.phantom_tables, vec!["shipments"]);
        assert_eq!(report.errors, vec!["Table 'shipments' does not exist"]);
    }

    #[test]
    fn cte_reference_is_not_a_phantom_table() {
        let report = detector().detect(
            "WITH recent AS (SELECT id FROM orders) SELECT id FROM recent",
            &case_schema(),
        );
        assert!(report.phantom_tables.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn phantom_column_is_lenient_by_default() {
        let report = detector().detect("SELECT s.motive FROM suspects s", &case_schema());
        assert_eq!(report.phantom_columns, vec!["s.motive"]);
        // Lenient mode: reported, but not an error.
        assert!(report.is_clean());
    }

    #[test]
    fn strict_mode_turns_phantom_columns_into_errors() {
        let report = detector()
            .with_column_mode(ColumnCheckMode::Strict)
            .detect("SELECT s.motive FROM suspects s", &case_schema());
        assert_eq!(report.phantom_columns, vec!["s.motive"]);
        assert_eq!(report.errors, vec!["Column 's.motive' does not exist"]);
    }

    #[test]
    fn ambiguous_unqualified_column_is_a_warning() {
        let report = detector().detect(
            "SELECT id FROM suspects JOIN orders ON orders.suspect_id = suspects.id",
            &case_schema(),
        );
        assert!(report.phantom_columns.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("ambiguous"));
        assert!(report.is_clean());
    }

    #[test]
    fn select_alias_resolves_unqualified_reference() {
        let report = detector().detect(
            "SELECT amount * 2 AS doubled FROM orders ORDER BY doubled",
            &case_schema(),
        );
        assert!(report.phantom_columns.is_empty());
    }

    #[test]
    fn subquery_export_resolves_qualified_reference() {
        let report = detector().detect(
            "SELECT x.total FROM (SELECT SUM(amount) AS total FROM orders) AS x",
            &case_schema(),
        );
        assert!(report.phantom_columns.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn missing_export_through_subquery_is_phantom() {
        let report = detector().detect(
            "SELECT x.missing FROM (SELECT SUM(amount) AS total FROM orders) AS x",
            &case_schema(),
        );
        assert_eq!(report.phantom_columns, vec!["x.missing"]);
    }

    #[test]
    fn wildcard_export_makes_subquery_unknowable() {
        let report = detector().detect(
            "SELECT x.anything FROM (SELECT * FROM orders) AS x",
            &case_schema(),
        );
        // SELECT * exports an unknown set; nothing can be judged.
        assert!(report.phantom_columns.is_empty());
    }

    #[test]
    fn builtin_identifier_is_exempt() {
        let report = detector().detect(
            "SELECT name FROM suspects WHERE occupation > CURRENT_TIMESTAMP",
            &case_schema(),
        );
        assert!(report.phantom_columns.is_empty());
    }

    #[test]
    fn unparseable_sql_is_an_error() {
        let report = detector().detect("SELEKT blorp FRUM nowhere", &case_schema());
        assert!(!report.is_clean());
        assert!(report.errors[0].contains("could not be parsed"));
    }

    #[test]
    fn write_statement_is_skipped_with_warning() {
        let report = detector().detect(
            "INSERT INTO suspects (name) VALUES ('X')",
            &case_schema(),
        );
        assert!(report.phantom_tables.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("INSERT"));
    }

    #[test]
    fn validate_accepts_prebuilt_identifier_sets() {
        let mut ids = IdentifierSet::default();
        ids.tables.insert("ghosts".to_string());
        let report = detector().validate(&ids, &case_schema());
        assert_eq!(report.phantom_tables, vec!["ghosts"]);
    }
}
