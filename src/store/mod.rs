//! Persistence for completed analysis records.

mod libsql_backend;
mod migrations;
mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, RecordFilter, RecordStats, StoredRecord};
