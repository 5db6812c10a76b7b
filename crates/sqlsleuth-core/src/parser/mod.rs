//! Multi-dialect SQL parsing with a deterministic fallback chain
//!
//! Parsing never fails hard: a statement written for one dialect is retried
//! under an ordered list of alternates, then under a lenient last-resort
//! pass, before the failure is reported as data on the returned
//! [`ParsedStatement`]. Identifier extraction only needs structure, not
//! dialect-perfect semantics, so a fallback parse is almost always usable.

use sqlparser::ast::Statement;
use sqlparser::parser::{Parser, ParserError};
use tracing::debug;

use crate::dialect::SqlDialect;

/// Result of parsing one SQL statement.
///
/// Invariant: `ast` is present exactly when `parse_error` is absent.
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    /// Parsed AST, absent when every strategy failed
    pub ast: Option<Statement>,
    /// Dialect that actually produced the AST; differs from the requested
    /// one when a fallback succeeded
    pub dialect_used: String,
    pub raw_text: String,
    /// First diagnostic from the strict parse, set iff `ast` is absent
    pub parse_error: Option<String>,
}

impl ParsedStatement {
    pub fn is_valid(&self) -> bool {
        self.ast.is_some()
    }

    pub fn is_select(&self) -> bool {
        matches!(self.ast, Some(Statement::Query(_)))
    }

    /// Coarse classification of the statement, "UNKNOWN" when unparsed
    pub fn statement_kind(&self) -> &'static str {
        match &self.ast {
            Some(Statement::Query(_)) => "SELECT",
            Some(Statement::Insert(_)) => "INSERT",
            Some(Statement::Update { .. }) => "UPDATE",
            Some(Statement::Delete(_)) => "DELETE",
            Some(_) => "OTHER",
            None => "UNKNOWN",
        }
    }
}

/// Maximum number of trailing tokens the lenient pass will drop.
const MAX_LENIENT_DROPS: usize = 16;

/// Parser that tries the requested dialect first and falls back through an
/// ordered chain of alternates.
///
/// The chain is a plain configuration value so tests can substitute a
/// shorter one; order determines which dialect gets credited in
/// `dialect_used`, so it must stay deterministic.
#[derive(Debug, Clone)]
pub struct MultiDialectParser {
    default_dialect: SqlDialect,
    fallback_chain: Vec<SqlDialect>,
}

impl MultiDialectParser {
    /// Default fallback order, ending with the permissive generic syntax.
    pub fn default_chain() -> Vec<SqlDialect> {
        vec![
            SqlDialect::Sqlite,
            SqlDialect::Postgres,
            SqlDialect::DuckDb,
            SqlDialect::BigQuery,
            SqlDialect::Generic,
        ]
    }

    pub fn new(default_dialect: SqlDialect) -> Self {
        Self {
            default_dialect,
            fallback_chain: Self::default_chain(),
        }
    }

    /// Replace the fallback chain
    pub fn with_chain(mut self, chain: Vec<SqlDialect>) -> Self {
        self.fallback_chain = chain;
        self
    }

    /// Parse `sql` under `requested` with fallback.
    ///
    /// An unrecognized dialect name is not an error here: the default
    /// dialect's syntax is used as the hint and parsing proceeds. Only the
    /// first statement of a multi-statement input is taken.
    pub fn parse(&self, sql: &str, requested: &str) -> ParsedStatement {
        let (hint, requested_name) = match requested.parse::<SqlDialect>() {
            Ok(dialect) => (dialect, dialect.to_string()),
            Err(_) => {
                debug!(dialect = requested, "unregistered dialect, using default syntax hint");
                (self.default_dialect, requested.to_string())
            }
        };

        // Strict pass under the requested dialect
        let first_error = match parse_first_statement(hint, sql) {
            Ok(ast) => {
                return ParsedStatement {
                    ast: Some(ast),
                    dialect_used: requested_name,
                    raw_text: sql.to_string(),
                    parse_error: None,
                }
            }
            Err(e) => e,
        };

        // Ordered fallback chain, skipping the dialect just tried
        for &fallback in &self.fallback_chain {
            if fallback == hint {
                continue;
            }
            if let Ok(ast) = parse_first_statement(fallback, sql) {
                debug!(requested = %requested_name, used = %fallback, "fallback dialect parse succeeded");
                return ParsedStatement {
                    ast: Some(ast),
                    dialect_used: fallback.to_string(),
                    raw_text: sql.to_string(),
                    parse_error: None,
                };
            }
        }

        // Lenient last resort under the originally requested dialect
        if let Some(ast) = lenient_parse(hint, sql) {
            debug!(requested = %requested_name, "lenient parse recovered a partial statement");
            return ParsedStatement {
                ast: Some(ast),
                dialect_used: requested_name,
                raw_text: sql.to_string(),
                parse_error: None,
            };
        }

        ParsedStatement {
            ast: None,
            dialect_used: requested_name,
            raw_text: sql.to_string(),
            parse_error: Some(first_error.to_string()),
        }
    }
}

impl Default for MultiDialectParser {
    fn default() -> Self {
        Self::new(SqlDialect::default())
    }
}

fn parse_first_statement(dialect: SqlDialect, sql: &str) -> Result<Statement, ParserError> {
    let statements = Parser::parse_sql(dialect.parser_dialect().as_ref(), sql)?;
    statements
        .into_iter()
        .next()
        .ok_or_else(|| ParserError::ParserError("empty statement".to_string()))
}

/// Best-effort recovery: drop trailing tokens one at a time (bounded) until
/// a prefix of the statement parses. Recovers statements with trailing junk
/// such as a dangling clause keyword.
fn lenient_parse(dialect: SqlDialect, sql: &str) -> Option<Statement> {
    let cuts = token_boundaries(sql.trim_end());
    for &cut in cuts.iter().rev().take(MAX_LENIENT_DROPS) {
        let candidate = &sql[..cut];
        if let Ok(statements) = Parser::parse_sql(dialect.parser_dialect().as_ref(), candidate) {
            if let Some(stmt) = statements.into_iter().next() {
                return Some(stmt);
            }
        }
    }
    None
}

/// Byte offsets where a whitespace run begins, i.e. the positions at which
/// the statement can be cut without splitting a token.
fn token_boundaries(sql: &str) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut prev_was_space = true;
    for (i, ch) in sql.char_indices() {
        let is_space = ch.is_whitespace();
        if is_space && !prev_was_space {
            cuts.push(i);
        }
        prev_was_space = is_space;
    }
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_keeps_requested_dialect() {
        let parser = MultiDialectParser::default();
        let parsed = parser.parse("SELECT id FROM suspects", "sqlite");
        assert!(parsed.is_valid());
        assert!(parsed.is_select());
        assert_eq!(parsed.dialect_used, "sqlite");
        assert!(parsed.parse_error.is_none());
    }

    #[test]
    fn unparseable_statement_reports_error_without_ast() {
        let parser = MultiDialectParser::default();
        let parsed = parser.parse("SELEKT blorp FRUM", "sqlite");
        assert!(!parsed.is_valid());
        assert!(parsed.parse_error.is_some());
        assert_eq!(parsed.statement_kind(), "UNKNOWN");
        assert_eq!(parsed.dialect_used, "sqlite");
    }

    #[test]
    fn parse_is_deterministic() {
        let parser = MultiDialectParser::default();
        let a = parser.parse("SELECT 1", "sqlite");
        let b = parser.parse("SELECT 1", "sqlite");
        assert_eq!(a.dialect_used, b.dialect_used);
        assert_eq!(a.is_valid(), b.is_valid());
    }

    #[test]
    fn unknown_dialect_name_is_a_hint_not_an_error() {
        let parser = MultiDialectParser::default();
        let parsed = parser.parse("SELECT id FROM suspects", "oracle");
        assert!(parsed.is_valid());
        // The requested name is kept for bookkeeping.
        assert_eq!(parsed.dialect_used, "oracle");
    }

    #[test]
    fn fallback_dialect_is_credited_consistently() {
        let parser = MultiDialectParser::default();
        // Star-except projection is rejected by sqlite and postgres but
        // parses under duckdb; the credited dialect must be stable.
        let sql = "SELECT * EXCEPT (secret) FROM suspects";
        let first = parser.parse(sql, "sqlite");
        let second = parser.parse(sql, "sqlite");
        assert!(first.is_valid(), "{:?}", first.parse_error);
        assert_eq!(first.dialect_used, "duckdb");
        assert_eq!(second.dialect_used, "duckdb");
    }

    #[test]
    fn lenient_pass_drops_trailing_junk() {
        let parser = MultiDialectParser::default();
        let parsed = parser.parse("SELECT id FROM suspects WHERE", "sqlite");
        assert!(parsed.is_valid(), "expected lenient recovery: {:?}", parsed.parse_error);
        assert_eq!(parsed.dialect_used, "sqlite");
    }

    #[test]
    fn only_first_statement_is_taken() {
        let parser = MultiDialectParser::default();
        let parsed = parser.parse("SELECT 1; SELECT 2", "sqlite");
        assert!(parsed.is_select());
    }

    #[test]
    fn fallback_chain_is_configurable() {
        let parser = MultiDialectParser::new(SqlDialect::Sqlite).with_chain(vec![]);
        // With no fallbacks, anything the strict and lenient passes reject
        // stays unparsed.
        let parsed = parser.parse("completely invalid input here", "sqlite");
        assert!(!parsed.is_valid());
    }
}
