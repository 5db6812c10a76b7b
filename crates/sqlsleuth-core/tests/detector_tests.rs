//! End-to-end tests for the parse -> extract -> validate pipeline.

use pretty_assertions::assert_eq;
use sqlsleuth_core::dialect::SqlDialect;
use sqlsleuth_core::extractor::{extract, AliasTarget};
use sqlsleuth_core::parser::MultiDialectParser;
use sqlsleuth_core::schema::{SchemaSnapshot, SnapshotBuilder};
use sqlsleuth_core::validator::{ColumnCheckMode, HallucinationDetector};

const CASE_FILE_DDL: &str = r#"
    CREATE TABLE suspects (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        occupation TEXT,
        interviewed INTEGER DEFAULT 0
    );

    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        suspect_id INTEGER NOT NULL REFERENCES suspects(id),
        amount REAL,
        placed_at TEXT
    );

    CREATE TABLE alibis (
        id INTEGER PRIMARY KEY,
        suspect_id INTEGER REFERENCES suspects(id),
        details TEXT,
        verified INTEGER DEFAULT 0
    );
"#;

fn case_schema() -> SchemaSnapshot {
    let mut builder = SnapshotBuilder::with_dialect(SqlDialect::Sqlite).database("case_file");
    builder.parse(CASE_FILE_DDL).expect("DDL parses");
    builder.build()
}

fn detector() -> HallucinationDetector {
    HallucinationDetector::new(SqlDialect::Sqlite)
}

#[test]
fn clean_multi_table_query_passes() {
    let sql = "SELECT s.name, o.amount \
               FROM suspects s \
               JOIN orders o ON o.suspect_id = s.id \
               WHERE s.interviewed = 0 \
               ORDER BY o.amount DESC";
    let report = detector().detect(sql, &case_schema());
    assert!(report.is_clean(), "unexpected findings: {report:?}");
    assert!(!report.has_findings());
}

#[test]
fn phantom_table_is_reported_with_message() {
    let report = detector().detect(
        "SELECT * FROM shipments WHERE weight > 10",
        &case_schema(),
    );
    assert_eq!(report.phantom_tables, vec!["shipments"]);
    assert_eq!(report.errors, vec!["Table 'shipments' does not exist"]);
}

#[test]
fn one_phantom_among_real_tables_is_isolated() {
    let sql = "SELECT s.name FROM suspects s JOIN shipments sh ON sh.suspect_id = s.id";
    let report = detector().detect(sql, &case_schema());
    assert_eq!(report.phantom_tables, vec!["shipments"]);
    // The real table produced no findings of its own.
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn cte_name_is_in_scope_for_the_outer_query() {
    let sql = "WITH recent AS (SELECT id AS rid, suspect_id FROM orders) \
               SELECT rid FROM recent";
    let report = detector().detect(sql, &case_schema());
    assert!(report.phantom_tables.is_empty(), "{report:?}");
    assert!(report.phantom_columns.is_empty(), "{report:?}");
}

#[test]
fn cte_export_set_is_enforced() {
    let sql = "WITH recent AS (SELECT id AS rid FROM orders) \
               SELECT recent.amount FROM recent";
    let report = detector().detect(sql, &case_schema());
    assert_eq!(report.phantom_columns, vec!["recent.amount"]);
}

#[test]
fn subquery_alias_exports_its_projection() {
    let sql = "SELECT x.total FROM (SELECT SUM(amount) AS total FROM orders) AS x";
    let report = detector().detect(sql, &case_schema());
    assert!(report.is_clean(), "{report:?}");
    assert!(report.phantom_columns.is_empty());
}

#[test]
fn wildcard_projections_are_never_flagged() {
    let report = detector().detect("SELECT * FROM suspects", &case_schema());
    assert!(!report.has_findings());

    let report = detector().detect(
        "SELECT x.whatever FROM (SELECT * FROM orders) AS x",
        &case_schema(),
    );
    assert!(report.phantom_columns.is_empty(), "{report:?}");
}

#[test]
fn column_mode_default_is_lenient() {
    let sql = "SELECT s.shoe_size FROM suspects s";
    let report = detector().detect(sql, &case_schema());
    assert_eq!(report.phantom_columns, vec!["s.shoe_size"]);
    assert!(report.is_clean());

    let strict = detector()
        .with_column_mode(ColumnCheckMode::Strict)
        .detect(sql, &case_schema());
    assert_eq!(
        strict.errors,
        vec!["Column 's.shoe_size' does not exist"]
    );
}

#[test]
fn builtin_functions_are_not_phantom_columns() {
    let sql = "SELECT name, COALESCE(occupation, 'unknown'), julianday(placed_at) \
               FROM suspects JOIN orders ON orders.suspect_id = suspects.id";
    let report = detector().detect(sql, &case_schema());
    assert!(report.phantom_columns.is_empty(), "{report:?}");
}

#[test]
fn detection_is_deterministic() {
    let sql = "SELECT s.name, ghost.thing FROM suspects s JOIN ghost ON ghost.id = s.id";
    let schema = case_schema();
    let first = detector().detect(sql, &schema);
    let second = detector().detect(sql, &schema);
    assert_eq!(first.phantom_tables, second.phantom_tables);
    assert_eq!(first.phantom_columns, second.phantom_columns);
    assert_eq!(first.errors, second.errors);
}

#[test]
fn extraction_is_total_even_for_garbage() {
    let parser = MultiDialectParser::default();
    let parsed = parser.parse("%%% not sql %%%", "sqlite");
    assert!(!parsed.is_valid());
    let ids = extract(&parsed);
    assert!(ids.is_empty());
}

#[test]
fn fallback_parse_reports_the_same_findings() {
    // Postgres-flavoured cast syntax fails under sqlite and parses via the
    // fallback chain; findings must not depend on which dialect succeeded.
    let sql = "SELECT amount::text FROM shipments";
    let report = detector().detect(sql, &case_schema());
    assert_eq!(report.phantom_tables, vec!["shipments"]);
}

#[test]
fn alias_bindings_survive_into_the_report() {
    let parser = MultiDialectParser::default();
    let parsed = parser.parse(
        "WITH w AS (SELECT id FROM orders) SELECT o.id FROM orders o, w",
        "sqlite",
    );
    let ids = extract(&parsed);
    assert_eq!(ids.aliases.get("w"), Some(&AliasTarget::Cte));
    assert_eq!(
        ids.aliases.get("o"),
        Some(&AliasTarget::Table("orders".to_string()))
    );
}

#[test]
fn write_statements_are_skipped_not_validated() {
    let report = detector().detect(
        "UPDATE suspects SET interviewed = 1 WHERE id = 4",
        &case_schema(),
    );
    assert!(report.phantom_tables.is_empty());
    assert!(report.phantom_columns.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("UPDATE"));
}

#[test]
fn ddl_built_schema_round_trips_through_detection() {
    let schema = case_schema();
    assert_eq!(schema.table_names(), vec!["suspects", "orders", "alibis"]);
    assert_eq!(
        schema
            .get_table("orders")
            .unwrap()
            .get_column("suspect_id")
            .unwrap()
            .foreign_key
            .as_deref(),
        Some("suspects.id")
    );

    let report = detector().detect(
        "SELECT a.details FROM alibis a WHERE a.verified = 1",
        &schema,
    );
    assert!(report.is_clean(), "{report:?}");
}

#[test]
fn case_differences_do_not_cause_findings() {
    let sql = "SELECT S.NAME FROM Suspects S WHERE S.Occupation IS NOT NULL";
    let report = detector().detect(sql, &case_schema());
    assert!(report.phantom_tables.is_empty(), "{report:?}");
    assert!(report.phantom_columns.is_empty(), "{report:?}");
}

#[test]
fn trailing_junk_is_recovered_and_still_validated() {
    // The lenient pass drops the dangling WHERE, leaving a valid prefix.
    let report = detector().detect("SELECT name FROM shipments WHERE", &case_schema());
    assert_eq!(report.phantom_tables, vec!["shipments"]);
}
