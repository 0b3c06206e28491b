//! Semantic memory for Saini.
//!
//! This crate provides:
//! - Embedding generation via Titan-compatible or OpenAI endpoints
//! - Append-only, owner-partitioned record storage (in-memory, JSON file, SQLite)
//! - The [`EmbeddingStore`] that embeds and appends one exchange
//! - The [`SimilarityRetriever`] that ranks an owner's memories by cosine similarity

pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod retriever;
pub mod similarity;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use embeddings::{EmbeddingProvider, EmbeddingResponse, OpenAIEmbeddings, TitanEmbeddings};
pub use error::MemoryError;
pub use ingest::EmbeddingStore;
pub use retriever::{Retrieval, RetrievalStatus, ScoredMemory, SimilarityRetriever};
pub use store::{FileMemoryStore, InMemoryStore, MemoryStore, Page, PageToken, SqliteMemoryStore};

use std::collections::HashMap;

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Opaque per-record metadata carried for display.
pub type Metadata = HashMap<String, serde_json::Value>;

/// One stored exchange with its embedding.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier.
    pub record_id: String,

    /// Owner the memory belongs to.
    pub owner_id: String,

    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Text that was embedded.
    pub text: String,

    /// Vector embedding.
    #[serde(default)]
    pub embedding: Vec<f32>,

    /// Embedding model that produced the vector.
    pub model: String,

    /// Metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl MemoryRecord {
    /// Create a new memory record with a fresh id and the current time.
    pub fn new(
        owner_id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            created_at: chrono::Utc::now(),
            text: text.into(),
            embedding,
            model: model.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether the embedding can take part in similarity ranking.
    pub fn has_usable_embedding(&self) -> bool {
        !self.embedding.is_empty() && self.embedding.iter().all(|x| x.is_finite())
    }

    /// Metadata value as a string, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Reject blank identifiers and text.
pub(crate) fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemoryError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
