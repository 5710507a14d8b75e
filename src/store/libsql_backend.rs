//! libSQL backend — async `Database` trait implementation.
//!
//! Stores each analysis record as indexed filter columns plus the full
//! record JSON. Supports local file and in-memory databases.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::pipeline::types::AnalysisRecord;
use crate::store::migrations;
use crate::store::traits::{Database, RecordFilter, RecordStats, StoredRecord};

const RECORD_COLUMNS: &str = "id, owner_id, payload, created_at";

/// libSQL database backend.
///
/// Holds a single connection reused for all operations;
/// `libsql::Connection` is safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::MIN_UTC)
}

fn row_to_record(row: &libsql::Row) -> Result<StoredRecord, DatabaseError> {
    let id: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("id column: {e}")))?;
    let owner_id: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("owner_id column: {e}")))?;
    let payload: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("payload column: {e}")))?;
    let created_str: String = row
        .get(3)
        .map_err(|e| DatabaseError::Query(format!("created_at column: {e}")))?;

    let record: AnalysisRecord = serde_json::from_str(&payload)
        .map_err(|e| DatabaseError::Serialization(format!("record payload: {e}")))?;

    Ok(StoredRecord {
        id,
        owner_id,
        record,
        created_at: parse_datetime(&created_str),
    })
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn insert_record(
        &self,
        owner_id: &str,
        record: &AnalysisRecord,
    ) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(record)
            .map_err(|e| DatabaseError::Serialization(format!("record payload: {e}")))?;
        let now = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "INSERT INTO records (id, owner_id, sender, subject, category,
                    is_important, importance_score, tone, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id.clone(),
                    owner_id,
                    record.message.sender.address.clone(),
                    record.message.subject.clone(),
                    record.category.clone(),
                    record.is_important as i64,
                    record.importance_score as i64,
                    record.tone.clone(),
                    payload,
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_record: {e}")))?;

        debug!(id = %id, owner_id, "Record inserted into DB");
        Ok(id)
    }

    async fn get_record(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<StoredRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1 AND owner_id = ?2"),
                params![id, owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_record: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_record: {e}"))),
        }
    }

    async fn list_records(
        &self,
        owner_id: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredRecord>, DatabaseError> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE owner_id = ?1");
        if filter.category.is_some() {
            sql.push_str(" AND category = ?2");
        }
        if let Some(important) = filter.is_important {
            sql.push_str(" AND is_important = ");
            sql.push(if important { '1' } else { '0' });
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut rows = match &filter.category {
            Some(category) => self
                .conn()
                .query(&sql, params![owner_id, category.clone()])
                .await,
            None => self.conn().query(&sql, params![owner_id]).await,
        }
        .map_err(|e| DatabaseError::Query(format!("list_records: {e}")))?;

        let mut records = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_record(&row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping record row: {e}");
                }
            }
        }
        Ok(records)
    }

    async fn delete_record(&self, id: &str, owner_id: &str) -> Result<bool, DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM records WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_record: {e}")))?;
        Ok(affected > 0)
    }

    async fn record_stats(&self, owner_id: &str) -> Result<RecordStats, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*), COALESCE(SUM(is_important), 0) FROM records WHERE owner_id = ?1",
                params![owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("record_stats: {e}")))?;

        let (total, important) = match rows.next().await {
            Ok(Some(row)) => {
                let total: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("total column: {e}")))?;
                let important: i64 = row
                    .get(1)
                    .map_err(|e| DatabaseError::Query(format!("important column: {e}")))?;
                (total as u64, important as u64)
            }
            _ => (0, 0),
        };

        let mut by_category = BTreeMap::new();
        let mut rows = self
            .conn()
            .query(
                "SELECT category, COUNT(*) FROM records WHERE owner_id = ?1 GROUP BY category",
                params![owner_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("record_stats by_category: {e}")))?;

        while let Ok(Some(row)) = rows.next().await {
            let category: String = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("category column: {e}")))?;
            let count: i64 = row
                .get(1)
                .map_err(|e| DatabaseError::Query(format!("count column: {e}")))?;
            by_category.insert(category, count as u64);
        }

        Ok(RecordStats {
            total,
            important,
            by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{
        Action, AnalysisRecord, BodyMetadata, Formality, ImportanceLevel, ParsedMessage, Sender,
        StageProvenance, Tier,
    };

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn record(category: &str, is_important: bool) -> AnalysisRecord {
        let score = if is_important { 60 } else { 20 };
        AnalysisRecord {
            message: ParsedMessage {
                sender: Sender {
                    display_name: "alice".into(),
                    address: "alice@example.com".into(),
                },
                subject: "Subject".into(),
                body: "Body text.".into(),
                metadata: BodyMetadata::default(),
                received_at: None,
                has_attachments: false,
            },
            category: category.into(),
            classification_confidence: 0.8,
            classification_reasoning: "test".into(),
            summary: "A summary.".into(),
            key_points: vec!["point".into()],
            action_items: vec![],
            importance_score: score,
            is_important,
            importance_level: ImportanceLevel::from_score(score),
            importance_reasons: vec![],
            tone: "neutral".into(),
            formality: Formality::Neutral,
            suggested_actions: vec![Action::Review],
            suggested_reply: None,
            provenance: vec![StageProvenance::new("classify", Tier::Ai)],
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let db = test_db().await;
        let id = db.insert_record("user-1", &record("Work", true)).await.unwrap();

        let loaded = db.get_record(&id, "user-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.owner_id, "user-1");
        assert_eq!(loaded.record.category, "Work");
        assert!(loaded.record.is_important);
        assert_eq!(loaded.record.summary, "A summary.");
        assert_eq!(loaded.record.suggested_actions, vec![Action::Review]);
    }

    #[tokio::test]
    async fn get_is_owner_scoped() {
        let db = test_db().await;
        let id = db.insert_record("user-1", &record("Work", false)).await.unwrap();
        assert!(db.get_record(&id, "user-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_missing_record_is_none() {
        let db = test_db().await;
        assert!(db.get_record("nope", "user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let db = test_db().await;
        db.insert_record("u", &record("Work", true)).await.unwrap();
        db.insert_record("u", &record("Newsletter", false)).await.unwrap();
        db.insert_record("u", &record("Work", false)).await.unwrap();

        let all = db.list_records("u", &RecordFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let work = db
            .list_records(
                "u",
                &RecordFilter {
                    category: Some("Work".into()),
                    is_important: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(work.len(), 2);
        assert!(work.iter().all(|r| r.record.category == "Work"));
    }

    #[tokio::test]
    async fn list_filters_by_importance() {
        let db = test_db().await;
        db.insert_record("u", &record("Work", true)).await.unwrap();
        db.insert_record("u", &record("Work", false)).await.unwrap();

        let important = db
            .list_records(
                "u",
                &RecordFilter {
                    category: None,
                    is_important: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(important.len(), 1);
        assert!(important[0].record.is_important);

        let both = db
            .list_records(
                "u",
                &RecordFilter {
                    category: Some("Work".into()),
                    is_important: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert!(!both[0].record.is_important);
    }

    #[tokio::test]
    async fn list_is_owner_scoped() {
        let db = test_db().await;
        db.insert_record("u1", &record("Work", false)).await.unwrap();
        db.insert_record("u2", &record("Work", false)).await.unwrap();

        let records = db.list_records("u1", &RecordFilter::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner_id, "u1");
    }

    #[tokio::test]
    async fn delete_record_scoped_to_owner() {
        let db = test_db().await;
        let id = db.insert_record("u1", &record("Work", false)).await.unwrap();

        assert!(!db.delete_record(&id, "u2").await.unwrap());
        assert!(db.delete_record(&id, "u1").await.unwrap());
        assert!(db.get_record(&id, "u1").await.unwrap().is_none());
        // Second delete is a no-op.
        assert!(!db.delete_record(&id, "u1").await.unwrap());
    }

    #[tokio::test]
    async fn stats_aggregate_per_owner() {
        let db = test_db().await;
        db.insert_record("u", &record("Work", true)).await.unwrap();
        db.insert_record("u", &record("Work", false)).await.unwrap();
        db.insert_record("u", &record("Newsletter", false)).await.unwrap();
        db.insert_record("other", &record("Spam", false)).await.unwrap();

        let stats = db.record_stats("u").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.important, 1);
        assert_eq!(stats.by_category.get("Work"), Some(&2));
        assert_eq!(stats.by_category.get("Newsletter"), Some(&1));
        assert!(stats.by_category.get("Spam").is_none());
    }

    #[tokio::test]
    async fn stats_empty_owner() {
        let db = test_db().await;
        let stats = db.record_stats("nobody").await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.important, 0);
        assert!(stats.by_category.is_empty());
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();
        db.insert_record("u", &record("Work", false)).await.unwrap();
    }

    #[tokio::test]
    async fn local_file_backend_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        let id = {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.insert_record("u", &record("Work", true)).await.unwrap()
        };
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let loaded = db.get_record(&id, "u").await.unwrap().unwrap();
        assert_eq!(loaded.record.category, "Work");
    }
}
