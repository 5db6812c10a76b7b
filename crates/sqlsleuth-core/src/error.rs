//! Core error types

use thiserror::Error;

/// Errors produced by the analysis core.
///
/// Validation findings (phantom tables, phantom columns, ambiguities) are
/// never errors; they are reported as data in
/// [`ValidationReport`](crate::validator::ValidationReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Requested dialect name is not registered.
    #[error("unsupported dialect '{name}'; supported dialects: {supported}")]
    UnsupportedDialect { name: String, supported: String },

    /// No parse strategy (strict, fallback chain, lenient) produced an AST.
    #[error("SQL parse failed: {0}")]
    ParseFailure(String),
}

impl Error {
    pub(crate) fn unsupported_dialect(name: impl Into<String>) -> Self {
        Error::UnsupportedDialect {
            name: name.into(),
            supported: crate::dialect::list_supported().join(", "),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
