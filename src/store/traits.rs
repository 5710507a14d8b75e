//! Async `Database` trait — the persistence collaborator contract.
//!
//! The pipeline hands a completed [`AnalysisRecord`] to this collaborator as
//! a value; the read path supports per-owner listing with category and
//! importance filters plus aggregate counts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DatabaseError;
use crate::pipeline::types::AnalysisRecord;

/// Filters for listing stored records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub category: Option<String>,
    pub is_important: Option<bool>,
}

/// Per-owner aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct RecordStats {
    pub total: u64,
    pub important: u64,
    pub by_category: BTreeMap<String, u64>,
}

/// A persisted analysis record.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub id: String,
    pub owner_id: String,
    pub record: AnalysisRecord,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic persistence for analysis records.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Store a completed record for an owner. Returns the generated id.
    async fn insert_record(
        &self,
        owner_id: &str,
        record: &AnalysisRecord,
    ) -> Result<String, DatabaseError>;

    /// Fetch one record, scoped to its owner.
    async fn get_record(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<StoredRecord>, DatabaseError>;

    /// List an owner's records, newest first.
    async fn list_records(
        &self,
        owner_id: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredRecord>, DatabaseError>;

    /// Delete one record. Returns whether anything was deleted.
    async fn delete_record(&self, id: &str, owner_id: &str) -> Result<bool, DatabaseError>;

    /// Aggregate counts for an owner.
    async fn record_stats(&self, owner_id: &str) -> Result<RecordStats, DatabaseError>;
}
