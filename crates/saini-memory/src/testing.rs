//! Deterministic fakes for tests in this and downstream crates.

use crate::embeddings::EmbeddingProvider;
use crate::error::MemoryError;
use crate::store::{MemoryStore, Page, PageToken};
use crate::{MemoryRecord, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider that returns fixed vectors for known texts.
pub struct StaticEmbeddings {
    model: String,
    dimension: Option<usize>,
    vectors: HashMap<String, Vec<f32>>,
    fallback: Option<Vec<f32>>,
    calls: AtomicUsize,
}

impl StaticEmbeddings {
    /// Provider for `model` with no known texts.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            dimension: None,
            vectors: HashMap::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Map `text` to `vector`.
    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Vector returned for any unknown text.
    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }

    /// Declare a dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| MemoryError::provider(format!("no vector for {text:?}")))
    }
}

/// Provider whose every call fails.
pub struct FailingEmbeddings;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddings {
    fn model(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(MemoryError::provider("embedding service unavailable"))
    }
}

/// Store whose every call fails.
pub struct FailingStore;

#[async_trait]
impl MemoryStore for FailingStore {
    async fn append(&self, _record: MemoryRecord) -> Result<()> {
        Err(MemoryError::storage("disk full"))
    }

    async fn scan_page(
        &self,
        _owner_id: &str,
        _after: Option<&PageToken>,
        _limit: usize,
    ) -> Result<Page> {
        Err(MemoryError::storage("table unavailable"))
    }

    async fn count(&self, _owner_id: &str) -> Result<usize> {
        Err(MemoryError::storage("table unavailable"))
    }
}
