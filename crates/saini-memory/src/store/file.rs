//! JSON file store.

use super::{MemoryStore, Page, PageToken, Partitions};
use crate::error::MemoryError;
use crate::{MemoryRecord, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// File-backed store with JSON persistence.
///
/// The whole document is rewritten on every append via a temporary file and
/// a rename, so a crash leaves either the old or the new contents on disk.
pub struct FileMemoryStore {
    path: PathBuf,
    partitions: RwLock<Partitions>,
}

impl FileMemoryStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let partitions = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let mut partitions: Partitions = serde_json::from_str(&data).map_err(|e| {
                MemoryError::storage(format!("failed to parse {}: {e}", path.display()))
            })?;
            partitions.reindex()?;
            partitions
        } else {
            Partitions::default()
        };

        debug!(path = %path.display(), "Opened file memory store");
        Ok(Self {
            path,
            partitions: RwLock::new(partitions),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, partitions: &Partitions) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let data = serde_json::to_string_pretty(partitions)
            .map_err(|e| MemoryError::storage(e.to_string()))?;
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for FileMemoryStore {
    async fn append(&self, record: MemoryRecord) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        let (record_id, owner_id) = (record.record_id.clone(), record.owner_id.clone());
        partitions.insert(record)?;

        if let Err(e) = self.save(&partitions) {
            partitions.rollback(&record_id, &owner_id);
            return Err(e);
        }
        Ok(())
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
