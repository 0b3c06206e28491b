//! Embedding ingestion.

use crate::embeddings::{check_vector, EmbeddingProvider};
use crate::store::MemoryStore;
use crate::{require_non_empty, MemoryRecord, Metadata, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Embeds one exchange and appends it to the store.
#[derive(Clone)]
pub struct EmbeddingStore {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn MemoryStore>,
}

impl EmbeddingStore {
    /// Create an ingester over `provider` and `store`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn MemoryStore>) -> Self {
        Self { provider, store }
    }

    /// Embed `text` and append it for `owner_id`. Returns the new record id.
    ///
    /// Every call creates a new record, even for identical inputs. Nothing
    /// is written if embedding fails, or if the vector's length differs from
    /// vectors the owner already stores for this model.
    pub async fn store(&self, owner_id: &str, text: &str, metadata: Metadata) -> Result<String> {
        let owner_id = require_non_empty("owner_id", owner_id)?;
        let text = require_non_empty("text", text)?;

        let vector = self.provider.embed(text).await?;
        let vector = check_vector(vector, self.provider.dimension())?;
        debug!(owner_id, model = self.provider.model(), dimension = vector.len(), "Embedded memory");

        let mut record = MemoryRecord::new(owner_id, text, vector, self.provider.model());
        record.metadata = metadata;
        let record_id = record.record_id.clone();

        self.store.append(record).await?;
        info!(owner_id, record_id = %record_id, "Stored memory");
        Ok(record_id)
    }
}
