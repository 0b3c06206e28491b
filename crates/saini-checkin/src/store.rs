//! Check-in history storage.

use crate::error::CheckinError;
use crate::Result;
use async_trait::async_trait;
use saini_core::CheckIn;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for check-in stores.
#[async_trait]
pub trait CheckinStore: Send + Sync {
    /// Persist a check-in.
    async fn put(&self, checkin: CheckIn) -> Result<()>;

    /// Check-ins of one user, or of everyone when `owner_id` is `None`,
    /// newest first.
    async fn list(&self, owner_id: Option<&str>) -> Result<Vec<CheckIn>>;

    /// Every user with at least one check-in, sorted.
    async fn users(&self) -> Result<Vec<String>>;
}

fn select(checkins: &[CheckIn], owner_id: Option<&str>) -> Vec<CheckIn> {
    let mut selected: Vec<CheckIn> = checkins
        .iter()
        .filter(|c| owner_id.map_or(true, |owner| c.owner_id == owner))
        .cloned()
        .collect();
    // Stable, so equal timestamps keep insertion order.
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}

fn distinct_users(checkins: &[CheckIn]) -> Vec<String> {
    checkins
        .iter()
        .map(|c| c.owner_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn require_owner(checkin: &CheckIn) -> Result<()> {
    if checkin.owner_id.trim().is_empty() {
        return Err(CheckinError::validation("owner_id must not be empty"));
    }
    Ok(())
}

/// In-memory check-in store.
#[derive(Default)]
pub struct InMemoryCheckinStore {
    checkins: RwLock<Vec<CheckIn>>,
}

impl InMemoryCheckinStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckinStore for InMemoryCheckinStore {
    async fn put(&self, checkin: CheckIn) -> Result<()> {
        require_owner(&checkin)?;
        self.checkins.write().await.push(checkin);
        Ok(())
    }

    async fn list(&self, owner_id: Option<&str>) -> Result<Vec<CheckIn>> {
        Ok(select(&self.checkins.read().await, owner_id))
    }

    async fn users(&self) -> Result<Vec<String>> {
        Ok(distinct_users(&self.checkins.read().await))
    }
}

/// Check-in store persisted as a JSON array, rewritten atomically on each put.
pub struct FileCheckinStore {
    path: PathBuf,
    checkins: RwLock<Vec<CheckIn>>,
}

impl FileCheckinStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let checkins = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str(&data).map_err(|e| {
                CheckinError::storage(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            Vec::new()
        };

        debug!(path = %path.display(), "Opened check-in store");
        Ok(Self {
            path,
            checkins: RwLock::new(checkins),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, checkins: &[CheckIn]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let data = serde_json::to_string_pretty(checkins)?;
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl CheckinStore for FileCheckinStore {
    async fn put(&self, checkin: CheckIn) -> Result<()> {
        require_owner(&checkin)?;
        let mut checkins = self.checkins.write().await;
        checkins.push(checkin);
        if let Err(e) = self.save(&checkins) {
            checkins.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn list(&self, owner_id: Option<&str>) -> Result<Vec<CheckIn>> {
        Ok(select(&self.checkins.read().await, owner_id))
    }

    async fn users(&self) -> Result<Vec<String>> {
        Ok(distinct_users(&self.checkins.read().await))
    }
}
