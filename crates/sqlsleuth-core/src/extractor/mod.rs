//! Identifier extraction
//!
//! Walks a parsed statement and collects every identifier reference into an
//! [`IdentifierSet`]: tables, columns, called functions, alias bindings, and
//! the column sets each CTE or aliased subquery exports to its enclosing
//! statement. The walk is a closed match over sqlparser's node variants;
//! nothing here consults a schema, so extraction is total - an absent AST
//! yields an empty set.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, Ident,
    JoinConstraint, JoinOperator, ObjectName, Query, Select, SelectItem, SetExpr, Statement,
    Subscript, TableAlias, TableFactor, TableWithJoins, WindowType,
};

use crate::parser::ParsedStatement;

/// What an alias stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasTarget {
    /// Alias for a physical table, holding the underlying table name
    Table(String),
    /// Name of a common table expression
    Cte,
    /// Alias of a derived table (subquery in FROM)
    Subquery,
}

impl fmt::Display for AliasTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasTarget::Table(name) => write!(f, "{}", name),
            AliasTarget::Cte => write!(f, "(cte)"),
            AliasTarget::Subquery => write!(f, "(subquery)"),
        }
    }
}

/// Every identifier referenced by one statement.
///
/// All collections deduplicate while preserving first-occurrence order.
/// Keys of `exported_columns` and members of `select_aliases` and the
/// exported sets are lower-cased; everything else keeps its written form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdentifierSet {
    /// Referenced table names, qualified when the source qualified them
    pub tables: IndexSet<String>,
    /// Referenced columns, "alias.column" when the reference was qualified
    pub columns: IndexSet<String>,
    /// Called functions, canonical UPPERCASE form
    pub functions: IndexSet<String>,
    /// Alias name -> what it denotes
    pub aliases: IndexMap<String, AliasTarget>,
    /// Output-column aliases from every SELECT list, any nesting depth
    pub select_aliases: IndexSet<String>,
    /// CTE or subquery alias -> column names it exposes
    pub exported_columns: IndexMap<String, IndexSet<String>>,
}

impl IdentifierSet {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.columns.is_empty()
            && self.functions.is_empty()
            && self.aliases.is_empty()
            && self.select_aliases.is_empty()
            && self.exported_columns.is_empty()
    }
}

/// Extract every identifier reference from a parsed statement.
pub fn extract(parsed: &ParsedStatement) -> IdentifierSet {
    let mut out = IdentifierSet::default();
    if let Some(ast) = &parsed.ast {
        Walker { out: &mut out }.statement(ast);
    }
    out
}

struct Walker<'a> {
    out: &'a mut IdentifierSet,
}

impl Walker<'_> {
    fn statement(&mut self, stmt: &Statement) {
        // Write statements are out of scope; only queries are walked.
        if let Statement::Query(query) = stmt {
            self.query(query);
        }
    }

    fn query(&mut self, query: &Query) {
        // CTEs first, in document order, so their aliases and exports are
        // registered before anything that references them.
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                let name = cte.alias.name.value.clone();
                self.out.aliases.insert(name.clone(), AliasTarget::Cte);

                let exported = exported_columns(&cte.alias, &cte.query.body);
                if !exported.is_empty() {
                    self.out.exported_columns.insert(name.to_lowercase(), exported);
                }

                self.query(&cte.query);
            }
        }

        self.set_expr(&query.body);

        if let Some(order_by) = &query.order_by {
            for ob in &order_by.exprs {
                self.expr(&ob.expr);
            }
        }
        if let Some(limit) = &query.limit {
            self.expr(limit);
        }
        for e in &query.limit_by {
            self.expr(e);
        }
        if let Some(offset) = &query.offset {
            self.expr(&offset.value);
        }
    }

    fn set_expr(&mut self, set_expr: &SetExpr) {
        match set_expr {
            SetExpr::Select(select) => self.select(select),
            SetExpr::Query(query) => self.query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.set_expr(left);
                self.set_expr(right);
            }
            SetExpr::Values(values) => {
                for row in &values.rows {
                    for e in row {
                        self.expr(e);
                    }
                }
            }
            _ => {}
        }
    }

    fn select(&mut self, select: &Select) {
        for table_with_joins in &select.from {
            self.table_with_joins(table_with_joins);
        }

        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => self.expr(expr),
                SelectItem::ExprWithAlias { expr, alias } => {
                    self.out.select_aliases.insert(alias.value.to_lowercase());
                    self.expr(expr);
                }
                // A wildcard resolves to no concrete names without schema
                // knowledge and contributes nothing here.
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {}
            }
        }

        if let Some(selection) = &select.selection {
            self.expr(selection);
        }
        match &select.group_by {
            GroupByExpr::All(_) => {}
            GroupByExpr::Expressions(exprs, _) => {
                for e in exprs {
                    self.expr(e);
                }
            }
        }
        if let Some(having) = &select.having {
            self.expr(having);
        }
    }

    fn table_with_joins(&mut self, table: &TableWithJoins) {
        self.table_factor(&table.relation);

        for join in &table.joins {
            self.table_factor(&join.relation);

            let constraint = match &join.join_operator {
                JoinOperator::Inner(c)
                | JoinOperator::LeftOuter(c)
                | JoinOperator::RightOuter(c)
                | JoinOperator::FullOuter(c)
                | JoinOperator::LeftSemi(c)
                | JoinOperator::RightSemi(c)
                | JoinOperator::LeftAnti(c)
                | JoinOperator::RightAnti(c) => Some(c),
                JoinOperator::CrossJoin
                | JoinOperator::CrossApply
                | JoinOperator::OuterApply
                | JoinOperator::AsOf { .. }
                | JoinOperator::Anti(_)
                | JoinOperator::Semi(_) => None,
            };

            if let Some(constraint) = constraint {
                match constraint {
                    JoinConstraint::On(expr) => self.expr(expr),
                    JoinConstraint::Using(columns) => {
                        for col in columns {
                            self.column(None, col);
                        }
                    }
                    JoinConstraint::Natural | JoinConstraint::None => {}
                }
            }
        }
    }

    fn table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table {
                name, alias, args, ..
            } => {
                // A table-valued function call, not a table reference.
                if args.is_some() {
                    self.out.functions.insert(function_name(name));
                    if let Some(alias) = alias {
                        self.register_derived_alias(alias);
                    }
                    return;
                }

                let qualified = qualified_table_name(name);
                self.out.tables.insert(qualified);

                if let Some(alias) = alias {
                    let underlying = name
                        .0
                        .last()
                        .map(|ident| ident.value.clone())
                        .unwrap_or_else(|| name.to_string());
                    self.out
                        .aliases
                        .insert(alias.name.value.clone(), AliasTarget::Table(underlying));
                }
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                self.query(subquery);

                if let Some(alias) = alias {
                    let name = alias.name.value.clone();
                    self.out.aliases.insert(name.clone(), AliasTarget::Subquery);

                    let exported = exported_columns(alias, &subquery.body);
                    if !exported.is_empty() {
                        self.out.exported_columns.insert(name.to_lowercase(), exported);
                    }
                }
            }
            TableFactor::TableFunction { alias, .. } => {
                if let Some(alias) = alias {
                    self.register_derived_alias(alias);
                }
            }
            TableFactor::Function { name, alias, .. } => {
                self.out.functions.insert(function_name(name));
                if let Some(alias) = alias {
                    self.register_derived_alias(alias);
                }
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                self.table_with_joins(table_with_joins);
            }
            _ => {}
        }
    }

    /// Register a derived-table alias (table function, UNNEST, and the
    /// like): treated as a subquery scope so the validator stays
    /// conservative, with exported columns only when explicitly listed.
    fn register_derived_alias(&mut self, alias: &TableAlias) {
        let name = alias.name.value.clone();
        self.out.aliases.insert(name.clone(), AliasTarget::Subquery);

        if !alias.columns.is_empty() {
            let exported: IndexSet<String> = alias
                .columns
                .iter()
                .map(|c| c.name.value.to_lowercase())
                .collect();
            self.out.exported_columns.insert(name.to_lowercase(), exported);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Identifier(ident) => self.column(None, ident),
            Expr::CompoundIdentifier(idents) => match idents.as_slice() {
                [qualifier, column] => self.column(Some(qualifier), column),
                // schema.table.column - keep the table qualifier only
                [_, qualifier, column] => self.column(Some(qualifier), column),
                _ => {}
            },
            Expr::Function(func) => self.function_call(func),
            Expr::BinaryOp { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::UnaryOp { expr, .. } | Expr::Nested(expr) => self.expr(expr),
            Expr::InList { expr, list, .. } => {
                self.expr(expr);
                for e in list {
                    self.expr(e);
                }
            }
            Expr::InSubquery { expr, subquery, .. } => {
                self.expr(expr);
                self.query(subquery);
            }
            Expr::Subquery(query) => self.query(query),
            Expr::Exists { subquery, .. } => self.query(subquery),
            Expr::Between {
                expr, low, high, ..
            } => {
                self.expr(expr);
                self.expr(low);
                self.expr(high);
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                self.out.functions.insert("CASE".to_string());
                if let Some(op) = operand {
                    self.expr(op);
                }
                for cond in conditions {
                    self.expr(cond);
                }
                for result in results {
                    self.expr(result);
                }
                if let Some(else_result) = else_result {
                    self.expr(else_result);
                }
            }
            // Function-call syntax that sqlparser represents as dedicated
            // expression variants; each maps to its canonical name.
            Expr::Cast { expr, .. } => {
                self.out.functions.insert("CAST".to_string());
                self.expr(expr);
            }
            Expr::Extract { expr, .. } => {
                self.out.functions.insert("EXTRACT".to_string());
                self.expr(expr);
            }
            Expr::Substring {
                expr,
                substring_from,
                substring_for,
                ..
            } => {
                self.out.functions.insert("SUBSTRING".to_string());
                self.expr(expr);
                if let Some(from) = substring_from {
                    self.expr(from);
                }
                if let Some(for_expr) = substring_for {
                    self.expr(for_expr);
                }
            }
            Expr::Trim {
                expr, trim_what, ..
            } => {
                self.out.functions.insert("TRIM".to_string());
                self.expr(expr);
                if let Some(what) = trim_what {
                    self.expr(what);
                }
            }
            Expr::Position { expr, r#in } => {
                self.out.functions.insert("POSITION".to_string());
                self.expr(expr);
                self.expr(r#in);
            }
            Expr::Overlay {
                expr,
                overlay_what,
                overlay_from,
                overlay_for,
            } => {
                self.out.functions.insert("OVERLAY".to_string());
                self.expr(expr);
                self.expr(overlay_what);
                self.expr(overlay_from);
                if let Some(for_expr) = overlay_for {
                    self.expr(for_expr);
                }
            }
            Expr::Ceil { expr, .. } => {
                self.out.functions.insert("CEIL".to_string());
                self.expr(expr);
            }
            Expr::Floor { expr, .. } => {
                self.out.functions.insert("FLOOR".to_string());
                self.expr(expr);
            }
            Expr::IsNull(e)
            | Expr::IsNotNull(e)
            | Expr::IsTrue(e)
            | Expr::IsFalse(e)
            | Expr::IsNotTrue(e)
            | Expr::IsNotFalse(e)
            | Expr::IsUnknown(e)
            | Expr::IsNotUnknown(e) => self.expr(e),
            Expr::IsDistinctFrom(a, b) | Expr::IsNotDistinctFrom(a, b) => {
                self.expr(a);
                self.expr(b);
            }
            Expr::Like { expr, pattern, .. }
            | Expr::ILike { expr, pattern, .. }
            | Expr::SimilarTo { expr, pattern, .. }
            | Expr::RLike { expr, pattern, .. } => {
                self.expr(expr);
                self.expr(pattern);
            }
            Expr::AnyOp { left, right, .. } | Expr::AllOp { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::AtTimeZone {
                timestamp,
                time_zone,
            } => {
                self.expr(timestamp);
                self.expr(time_zone);
            }
            Expr::Collate { expr, .. } => self.expr(expr),
            Expr::Tuple(exprs) => {
                for e in exprs {
                    self.expr(e);
                }
            }
            Expr::Array(array) => {
                for e in &array.elem {
                    self.expr(e);
                }
            }
            Expr::Subscript { expr, subscript } => {
                self.expr(expr);
                match subscript.as_ref() {
                    Subscript::Index { index } => self.expr(index),
                    Subscript::Slice {
                        lower_bound,
                        upper_bound,
                        stride,
                    } => {
                        if let Some(lb) = lower_bound {
                            self.expr(lb);
                        }
                        if let Some(ub) = upper_bound {
                            self.expr(ub);
                        }
                        if let Some(s) = stride {
                            self.expr(s);
                        }
                    }
                }
            }
            Expr::Interval(interval) => self.expr(&interval.value),
            Expr::GroupingSets(sets) | Expr::Cube(sets) | Expr::Rollup(sets) => {
                for set in sets {
                    for e in set {
                        self.expr(e);
                    }
                }
            }
            // Literals and remaining variants carry no identifiers we track.
            _ => {}
        }
    }

    fn function_call(&mut self, func: &Function) {
        self.out.functions.insert(function_name(&func.name));

        match &func.args {
            FunctionArguments::List(arg_list) => {
                for arg in &arg_list.args {
                    match arg {
                        FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => self.expr(e),
                        FunctionArg::Named { arg, .. } | FunctionArg::ExprNamed { arg, .. } => {
                            if let FunctionArgExpr::Expr(e) = arg {
                                self.expr(e);
                            }
                        }
                        // COUNT(*) and friends
                        _ => {}
                    }
                }
            }
            FunctionArguments::Subquery(query) => self.query(query),
            FunctionArguments::None => {}
        }

        if let Some(filter) = &func.filter {
            self.expr(filter);
        }
        if let Some(WindowType::WindowSpec(spec)) = &func.over {
            for e in &spec.partition_by {
                self.expr(e);
            }
            for ob in &spec.order_by {
                self.expr(&ob.expr);
            }
        }
        for ob in &func.within_group {
            self.expr(&ob.expr);
        }
    }

    fn column(&mut self, qualifier: Option<&Ident>, column: &Ident) {
        let name = match qualifier {
            Some(q) => format!("{}.{}", q.value, column.value),
            None => column.value.clone(),
        };
        self.out.columns.insert(name);
    }
}

/// The column names a CTE or aliased subquery exposes: the explicit alias
/// column list when present, otherwise inferred from the projection of its
/// innermost SELECT. An expression with neither an alias nor a bare column
/// name exports nothing - it cannot be referenced by name from outside.
fn exported_columns(alias: &TableAlias, body: &SetExpr) -> IndexSet<String> {
    if !alias.columns.is_empty() {
        return alias
            .columns
            .iter()
            .map(|c| c.name.value.to_lowercase())
            .collect();
    }
    projection_output_names(body)
}

fn projection_output_names(body: &SetExpr) -> IndexSet<String> {
    match body {
        SetExpr::Select(select) => {
            let mut names = IndexSet::new();
            for item in &select.projection {
                match item {
                    SelectItem::ExprWithAlias { alias, .. } => {
                        names.insert(alias.value.to_lowercase());
                    }
                    SelectItem::UnnamedExpr(Expr::Identifier(ident)) => {
                        names.insert(ident.value.to_lowercase());
                    }
                    SelectItem::UnnamedExpr(Expr::CompoundIdentifier(idents)) => {
                        if let Some(last) = idents.last() {
                            names.insert(last.value.to_lowercase());
                        }
                    }
                    _ => {}
                }
            }
            names
        }
        // A set operation exports the left side's names.
        SetExpr::SetOperation { left, .. } => projection_output_names(left),
        SetExpr::Query(query) => projection_output_names(&query.body),
        _ => IndexSet::new(),
    }
}

/// Canonical UPPERCASE name for a called function (last path segment).
fn function_name(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.to_uppercase())
        .unwrap_or_else(|| name.to_string().to_uppercase())
}

/// Table name with its catalog/schema qualifiers when present.
fn qualified_table_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MultiDialectParser;
    use pretty_assertions::assert_eq;

    fn extract_sql(sql: &str) -> IdentifierSet {
        let parsed = MultiDialectParser::default().parse(sql, "sqlite");
        assert!(parsed.is_valid(), "parse failed: {:?}", parsed.parse_error);
        extract(&parsed)
    }

    #[test]
    fn empty_set_for_unparsed_statement() {
        let parsed = MultiDialectParser::default().parse("not sql at all %%%", "sqlite");
        assert!(!parsed.is_valid());
        let ids = extract(&parsed);
        assert!(ids.is_empty());
    }

    #[test]
    fn collects_tables_in_first_occurrence_order() {
        let ids = extract_sql(
            "SELECT s.name, a.details FROM suspects s JOIN alibis a ON a.suspect_id = s.id JOIN suspects x ON x.id = a.suspect_id",
        );
        let tables: Vec<&str> = ids.tables.iter().map(|s| s.as_str()).collect();
        assert_eq!(tables, vec!["suspects", "alibis"]);
    }

    #[test]
    fn records_table_aliases() {
        let ids = extract_sql("SELECT s.name FROM suspects s");
        assert_eq!(
            ids.aliases.get("s"),
            Some(&AliasTarget::Table("suspects".to_string()))
        );
        assert!(ids.columns.contains("s.name"));
    }

    #[test]
    fn qualified_table_names_are_preserved() {
        let ids = extract_sql("SELECT id FROM main.suspects");
        assert!(ids.tables.contains("main.suspects"));
    }

    #[test]
    fn cte_registers_alias_and_exports() {
        let ids =
            extract_sql("WITH recent AS (SELECT id AS rid FROM orders) SELECT rid FROM recent");
        assert_eq!(ids.aliases.get("recent"), Some(&AliasTarget::Cte));
        assert_eq!(ids.aliases.get("recent").unwrap().to_string(), "(cte)");

        let exported = ids.exported_columns.get("recent").unwrap();
        assert_eq!(exported.len(), 1);
        assert!(exported.contains("rid"));

        // The CTE body's table is still collected.
        assert!(ids.tables.contains("orders"));
        // The CTE reference shows up as a table reference too.
        assert!(ids.tables.contains("recent"));
    }

    #[test]
    fn cte_with_explicit_column_list() {
        let ids = extract_sql(
            "WITH totals(total_amount) AS (SELECT SUM(amount) FROM orders) SELECT total_amount FROM totals",
        );
        let exported = ids.exported_columns.get("totals").unwrap();
        assert!(exported.contains("total_amount"));
    }

    #[test]
    fn subquery_alias_exports_projection() {
        let ids = extract_sql(
            "SELECT x.total FROM (SELECT SUM(amount) AS total FROM orders) AS x",
        );
        assert_eq!(ids.aliases.get("x"), Some(&AliasTarget::Subquery));
        assert_eq!(ids.aliases.get("x").unwrap().to_string(), "(subquery)");

        let exported = ids.exported_columns.get("x").unwrap();
        assert!(exported.contains("total"));
        assert!(ids.functions.contains("SUM"));
    }

    #[test]
    fn exported_columns_keys_are_also_aliases() {
        let ids = extract_sql(
            "WITH a AS (SELECT id FROM t1) SELECT * FROM a JOIN (SELECT id AS b_id FROM t2) AS b ON b.b_id = a.id",
        );
        for key in ids.exported_columns.keys() {
            assert!(
                ids.aliases.keys().any(|a| a.eq_ignore_ascii_case(key)),
                "exported key '{key}' has no alias entry"
            );
        }
    }

    #[test]
    fn wildcard_contributes_no_columns() {
        let ids = extract_sql("SELECT * FROM orders");
        assert!(ids.columns.is_empty());
    }

    #[test]
    fn unaliased_expression_exports_nothing() {
        let ids = extract_sql("SELECT y.id FROM (SELECT id, amount * 2 FROM orders) AS y");
        let exported = ids.exported_columns.get("y").unwrap();
        assert_eq!(exported.len(), 1);
        assert!(exported.contains("id"));
    }

    #[test]
    fn set_operation_exports_left_side() {
        let ids = extract_sql(
            "WITH u AS (SELECT id FROM t1 UNION SELECT other_id FROM t2) SELECT id FROM u",
        );
        let exported = ids.exported_columns.get("u").unwrap();
        assert_eq!(exported.len(), 1);
        assert!(exported.contains("id"));
    }

    #[test]
    fn function_names_are_uppercased_and_deduplicated() {
        let ids = extract_sql("SELECT count(*), COUNT(*), lower(name) FROM suspects");
        let functions: Vec<&str> = ids.functions.iter().map(|s| s.as_str()).collect();
        assert_eq!(functions, vec!["COUNT", "LOWER"]);
    }

    #[test]
    fn cast_maps_to_canonical_name() {
        let ids = extract_sql("SELECT CAST(amount AS TEXT) FROM orders");
        assert!(ids.functions.contains("CAST"));
        assert!(ids.columns.contains("amount"));
    }

    #[test]
    fn case_expression_maps_to_canonical_name() {
        let ids = extract_sql(
            "SELECT CASE WHEN amount > 100 THEN 'big' ELSE 'small' END FROM orders",
        );
        assert!(ids.functions.contains("CASE"));
        assert!(ids.columns.contains("amount"));
    }

    #[test]
    fn select_aliases_are_collected_lowercased_at_any_depth() {
        let ids = extract_sql(
            "SELECT name AS SuspectName FROM suspects WHERE id IN (SELECT suspect_id AS SID FROM alibis)",
        );
        assert!(ids.select_aliases.contains("suspectname"));
        assert!(ids.select_aliases.contains("sid"));
    }

    #[test]
    fn window_function_internals_are_walked() {
        let ids = extract_sql(
            "SELECT name, ROW_NUMBER() OVER (PARTITION BY occupation ORDER BY interviewed) AS rn FROM suspects",
        );
        assert!(ids.functions.contains("ROW_NUMBER"));
        assert!(ids.columns.contains("occupation"));
        assert!(ids.columns.contains("interviewed"));
        assert!(ids.select_aliases.contains("rn"));
    }

    #[test]
    fn join_using_columns_are_recorded() {
        let ids = extract_sql("SELECT name FROM suspects JOIN alibis USING (suspect_id)");
        assert!(ids.columns.contains("suspect_id"));
    }
}
