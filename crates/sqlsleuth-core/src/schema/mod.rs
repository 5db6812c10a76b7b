//! Schema snapshot model and DDL ingestion

mod builder;
mod snapshot;

pub use builder::SnapshotBuilder;
pub use snapshot::{ColumnInfo, SchemaSnapshot, TableInfo};
