//! In-process store.

use super::{MemoryStore, Page, PageToken, Partitions};
use crate::{MemoryRecord, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory store partitioned by owner. Contents are lost on drop.
#[derive(Default)]
pub struct InMemoryStore {
    partitions: RwLock<Partitions>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn append(&self, record: MemoryRecord) -> Result<()> {
        self.partitions.write().await.insert(record)
    }

    async fn scan_page(
        &self,
        owner_id: &str,
        after: Option<&PageToken>,
        limit: usize,
    ) -> Result<Page> {
        self.partitions.read().await.page(owner_id, after, limit)
    }

    async fn count(&self, owner_id: &str) -> Result<usize> {
        Ok(self.partitions.read().await.count(owner_id))
    }
}
