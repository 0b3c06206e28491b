//! Similarity retrieval over an owner's memories.

use crate::embeddings::{check_vector, EmbeddingProvider};
use crate::error::MemoryError;
use crate::similarity::{cosine_similarity, rank, round_score};
use crate::store::{MemoryStore, DEFAULT_PAGE_SIZE};
use crate::{require_non_empty, MemoryRecord, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether an owner had anything to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    /// At least one record was scored.
    Found,
    /// The owner has no rankable records.
    NoMemories,
}

/// A record with its rounded similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    /// The stored record.
    pub record: MemoryRecord,

    /// Cosine similarity to the query, rounded to four decimals.
    pub similarity: f64,
}

/// Result of a retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    /// Owner whose records were searched.
    pub owner_id: String,

    /// Query text, trimmed.
    pub query: String,

    /// Requested number of matches.
    pub top_k: usize,

    /// Whether the owner had any rankable records.
    pub status: RetrievalStatus,

    /// Best matches, most similar first.
    pub memories: Vec<ScoredMemory>,

    /// Records that were scored.
    pub candidates: usize,

    /// Records excluded for an unusable embedding or another model.
    pub skipped: usize,
}

/// Ranks an owner's stored memories against a query.
#[derive(Clone)]
pub struct SimilarityRetriever {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn MemoryStore>,
    page_size: usize,
}

impl SimilarityRetriever {
    /// Create a retriever over `provider` and `store`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn MemoryStore>) -> Self {
        Self {
            provider,
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size used when loading an owner's records.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Return the `top_k` memories of `owner_id` most similar to `query`.
    pub async fn retrieve(&self, owner_id: &str, query: &str, top_k: usize) -> Result<Retrieval> {
        let owner_id = require_non_empty("owner_id", owner_id)?;
        let query = require_non_empty("query", query)?;

        let query_vector = self.provider.embed(query).await?;
        let query_vector = check_vector(query_vector, self.provider.dimension())?;
        let model = self.provider.model();

        let records = self.store.load_owner(owner_id, self.page_size).await?;
        let total = records.len();

        let mut scored = Vec::with_capacity(total);
        for record in records {
            if record.model != model {
                debug!(record_id = %record.record_id, model = %record.model, "Skipping record from another model");
                continue;
            }
            if !record.has_usable_embedding() {
                warn!(
                    record_id = %record.record_id,
                    owner_id,
                    "Excluding record with missing or non-finite embedding"
                );
                continue;
            }
            if record.embedding.len() != query_vector.len() {
                return Err(MemoryError::validation(format!(
                    "record {} has {} dimensions but the query has {}",
                    record.record_id,
                    record.embedding.len(),
                    query_vector.len()
                )));
            }

            let score = cosine_similarity(&query_vector, &record.embedding);
            scored.push((record, score));
        }

        let candidates = scored.len();
        let status = if candidates == 0 {
            RetrievalStatus::NoMemories
        } else {
            RetrievalStatus::Found
        };

        let memories = rank(scored, top_k)
            .into_iter()
            .map(|(record, score)| ScoredMemory {
                record,
                similarity: round_score(score),
            })
            .collect::<Vec<_>>();

        debug!(
            owner_id,
            candidates,
            returned = memories.len(),
            "Retrieved memories"
        );

        Ok(Retrieval {
            owner_id: owner_id.to_string(),
            query: query.to_string(),
            top_k,
            status,
            memories,
            candidates,
            skipped: total - candidates,
        })
    }
}
