//! sqlsleuth-core - SQL static analysis against a schema snapshot
//!
//! The core pipeline has three stages, each usable on its own:
//!
//! 1. [`parser::MultiDialectParser`] parses a statement, falling back
//!    through alternate dialects and a lenient recovery pass.
//! 2. [`extractor::extract`] walks the AST and collects every identifier
//!    reference into an [`extractor::IdentifierSet`].
//! 3. [`validator::HallucinationDetector`] checks the identifiers against a
//!    [`schema::SchemaSnapshot`] and reports phantom tables and columns.
//!
//! ```
//! use sqlsleuth_core::dialect::SqlDialect;
//! use sqlsleuth_core::schema::SnapshotBuilder;
//! use sqlsleuth_core::validator::HallucinationDetector;
//!
//! let mut builder = SnapshotBuilder::new();
//! builder.parse("CREATE TABLE suspects (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
//! let schema = builder.build();
//!
//! let detector = HallucinationDetector::new(SqlDialect::Sqlite);
//! let report = detector.detect("SELECT name FROM shipments", &schema);
//! assert_eq!(report.phantom_tables, vec!["shipments"]);
//! ```

pub mod dialect;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod schema;
pub mod validator;

pub use dialect::SqlDialect;
pub use error::{Error, Result};
pub use extractor::{extract, AliasTarget, IdentifierSet};
pub use parser::{MultiDialectParser, ParsedStatement};
pub use schema::{ColumnInfo, SchemaSnapshot, SnapshotBuilder, TableInfo};
pub use validator::{ColumnCheckMode, HallucinationDetector, ValidationReport};
