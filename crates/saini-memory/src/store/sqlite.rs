//! SQLite store.
//!
//! Records live in one table indexed by `(owner_id, seq)`. Pages are fetched
//! with keyset pagination on the autoincrement `seq`, so loading an owner
//! touches only that owner's rows. Embeddings are stored as little-endian
//! `f32` blobs.

use super::{dimension_mismatch, MemoryStore, Page, PageToken};
use crate::error::MemoryError;
use crate::{Metadata, MemoryRecord, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS memory_records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id TEXT NOT NULL UNIQUE,
    owner_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    text TEXT NOT NULL,
    model TEXT NOT NULL,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}'
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memory_records_owner ON memory_records (owner_id, seq)";

/// Store backed by a SQLite database.
#[derive(Clone)]
pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    /// Connect to (or create) the database at `path` and apply the schema.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        debug!(path = %path.display(), "Opened sqlite memory store");
        Self::from_pool(pool).await
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // One connection that never idles out, or the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the table if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn append(&self, record: MemoryRecord) -> Result<()> {
        if record.owner_id.trim().is_empty() {
            return Err(MemoryError::validation("owner_id must not be empty"));
        }
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| MemoryError::storage(format!("failed to encode metadata: {e}")))?;

        let dimension = record.embedding.len() as i64;
        // Skips the insert when the owner already holds vectors of another
        // length from the same model.
        let result = sqlx::query(
            "INSERT INTO memory_records (record_id, owner_id, created_at, text, model, dimension, embedding, metadata)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?
             WHERE ? = 0 OR NOT EXISTS (
                 SELECT 1 FROM memory_records
                 WHERE owner_id = ? AND model = ? AND dimension > 0 AND dimension != ?
             )",
        )
        .bind(&record.record_id)
        .bind(&record.owner_id)
        .bind(record.created_at)
        .bind(&record.text)
        .bind(&record.model)
        .bind(dimension)
        .bind(encode_embedding(&record.embedding))
        .bind(metadata)
        .bind(dimension)
        .bind(&record.owner_id)
        .bind(&record.model)
        .bind(dimension)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let expected: Option<(i64,)> = sqlx::query_as(
                "SELECT dimension FROM memory_records
                 WHERE owner_id = ? AND model = ? AND dimension > 0
                 ORDER BY seq ASC
                 LIMIT 1",
            )
            .bind(&record.owner_id)
            .bind(&record.model)
            .fetch_optional(&self.pool)
            .await?;
            let expected = expected
                .and_then(|(d,)| usize::try_from(d).ok())
                .unwrap_or_default();
            return Err(dimension_mismatch(&record, expected));
        }

        Ok(())
    }

    async fn scan_page(
        &self,
        owner_id: &str,
        after: Option<&PageToken>,
        limit: usize,
    ) -> Result<Page> {
        let after_seq = match after {
            Some(token) => token.parse::<i64>()?,
            None => 0,
        };
        let limit = limit.max(1);
        // One extra row tells us whether another page exists.
        let fetch = i64::try_from(limit).unwrap_or(i64::MAX).saturating_add(1);

        let mut rows = sqlx::query_as::<_, RecordRow>(
            "SELECT seq, record_id, owner_id, created_at, text, model, embedding, metadata
             FROM memory_records
             WHERE owner_id = ? AND seq > ?
             ORDER BY seq ASC
             LIMIT ?",
        )
        .bind(owner_id)
        .bind(after_seq)
        .bind(fetch)
        .fetch_all(&self.pool)
        .await?;

        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next = if has_more {
            rows.last().map(|row| PageToken::new(row.seq))
        } else {
            None
        };

        Ok(Page {
            records: rows.into_iter().map(RecordRow::into_record).collect(),
            next,
        })
    }

    async fn count(&self, owner_id: &str) -> Result<usize> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM memory_records WHERE owner_id = ?")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    seq: i64,
    record_id: String,
    owner_id: String,
    created_at: DateTime<Utc>,
    text: String,
    model: String,
    embedding: Vec<u8>,
    metadata: String,
}

impl RecordRow {
    fn into_record(self) -> MemoryRecord {
        let embedding = decode_embedding(&self.embedding).unwrap_or_else(|| {
            warn!(
                record_id = %self.record_id,
                bytes = self.embedding.len(),
                "Malformed embedding blob"
            );
            Vec::new()
        });
        let metadata: Metadata = serde_json::from_str(&self.metadata).unwrap_or_else(|e| {
            warn!(record_id = %self.record_id, error = %e, "Malformed record metadata");
            Metadata::new()
        });

        MemoryRecord {
            record_id: self.record_id,
            owner_id: self.owner_id,
            created_at: self.created_at,
            text: self.text,
            embedding,
            model: self.model,
            metadata,
        }
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_blob_roundtrip() {
        let v = vec![0.1f32, -2.5, f32::MIN_POSITIVE, 1e30];
        assert_eq!(decode_embedding(&encode_embedding(&v)), Some(v));
        assert_eq!(decode_embedding(&[1, 2, 3]), None);
        assert_eq!(decode_embedding(&[]), Some(vec![]));
    }

    #[tokio::test]
    async fn test_sqlite_append_and_load() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        let record = MemoryRecord::new("u1", "hello", vec![0.5, 0.25], "m")
            .with_metadata("tone", serde_json::json!("gentle"));
        store.append(record.clone()).await.unwrap();
        store
            .append(MemoryRecord::new("u2", "other", vec![1.0, 0.0], "m"))
            .await
            .unwrap();

        let records = store.load_owner("u1", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id, record.record_id);
        assert_eq!(records[0].embedding, vec![0.5, 0.25]);
        assert_eq!(records[0].meta_str("tone"), Some("gentle"));
        assert_eq!(store.count("u2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_keyset_pagination() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        for n in 0..5 {
            store
                .append(MemoryRecord::new("u1", format!("m{n}"), vec![1.0], "m"))
                .await
                .unwrap();
            store
                .append(MemoryRecord::new("u2", format!("x{n}"), vec![1.0], "m"))
                .await
                .unwrap();
        }

        let first = store.scan_page("u1", None, 2).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert!(first.next.is_some());

        let all = store.load_owner("u1", 2).await.unwrap();
        let texts: Vec<_> = all.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_sqlite_exact_page_boundary() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        for n in 0..4 {
            store
                .append(MemoryRecord::new("u1", format!("m{n}"), vec![1.0], "m"))
                .await
                .unwrap();
        }
        let first = store.scan_page("u1", None, 4).await.unwrap();
        assert_eq!(first.records.len(), 4);
        assert!(first.next.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_rejects_duplicate_id() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        let record = MemoryRecord::new("u1", "once", vec![1.0], "m");
        store.append(record.clone()).await.unwrap();
        assert!(matches!(
            store.append(record).await,
            Err(MemoryError::Storage(_))
        ));
        assert_eq!(store.count("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_rejects_mixed_dimensions() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        store
            .append(MemoryRecord::new("u1", "first", vec![1.0, 0.0], "m"))
            .await
            .unwrap();

        let err = store
            .append(MemoryRecord::new("u1", "second", vec![1.0, 0.0, 0.0], "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Validation(ref msg) if msg.contains("2-dimension")));
        assert_eq!(store.count("u1").await.unwrap(), 1);

        store
            .append(MemoryRecord::new("u2", "elsewhere", vec![1.0, 0.0, 0.0], "m"))
            .await
            .unwrap();
        store
            .append(MemoryRecord::new("u1", "new model", vec![1.0; 4], "other"))
            .await
            .unwrap();
        store
            .append(MemoryRecord::new("u1", "same width", vec![0.0, 1.0], "m"))
            .await
            .unwrap();
        assert_eq!(store.count("u1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sqlite_huge_page_limit() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        store
            .append(MemoryRecord::new("u1", "only", vec![1.0], "m"))
            .await
            .unwrap();
        let page = store.scan_page("u1", None, usize::MAX).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.next.is_none());
    }

    #[tokio::test]
    async fn test_sqlite_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/memories.db");
        {
            let store = SqliteMemoryStore::connect(&path).await.unwrap();
            store
                .append(MemoryRecord::new("u1", "kept", vec![0.5], "m"))
                .await
                .unwrap();
            store.close().await;
        }
        let store = SqliteMemoryStore::connect(&path).await.unwrap();
        assert_eq!(store.count("u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_malformed_blob_decodes_empty() {
        let store = SqliteMemoryStore::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO memory_records (record_id, owner_id, created_at, text, model, dimension, embedding, metadata)
             VALUES ('r1', 'u1', ?, 'bad', 'm', 1, x'010203', 'not json')",
        )
        .bind(Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();

        let records = store.load_owner("u1", 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].embedding.is_empty());
        assert!(records[0].metadata.is_empty());
    }
}
