//! Append-only memory storage.
//!
//! Every backend partitions records by owner and returns them in insertion
//! order through [`MemoryStore::scan_page`]. [`MemoryStore::load_owner`]
//! drains the pages so callers never see continuation tokens.

mod file;
mod memory;
mod sqlite;

pub use file::FileMemoryStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;

use crate::error::MemoryError;
use crate::{MemoryRecord, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Default number of records fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Opaque continuation token returned by [`MemoryStore::scan_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    pub(crate) fn new(token: impl ToString) -> Self {
        Self(token.to_string())
    }

    pub(crate) fn parse<T: std::str::FromStr>(&self) -> Result<T> {
        self.0
            .parse()
            .map_err(|_| MemoryError::validation(format!("invalid page token: {}", self.0)))
    }
}

/// One page of an owner's records.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Records in insertion order.
    pub records: Vec<MemoryRecord>,

    /// Token for the next page, `None` when this was the last one.
    pub next: Option<PageToken>,
}

/// Trait for memory stores.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append a record. Fails if the id already exists; never overwrites.
    ///
    /// A non-empty embedding whose length differs from the owner's existing
    /// records of the same model is rejected with
    /// [`MemoryError::Validation`].
    async fn append(&self, record: MemoryRecord) -> Result<()>;

    /// Fetch up to `limit` records of `owner_id` after `after`.
    async fn scan_page(
        &self,
        owner_id: &str,
        after: Option<&PageToken>,
        limit: usize,
    ) -> Result<Page>;

    /// Count an owner's records.
    async fn count(&self, owner_id: &str) -> Result<usize>;

    /// Load every record of an owner, following page tokens to the end.
    async fn load_owner(&self, owner_id: &str, page_size: usize) -> Result<Vec<MemoryRecord>> {
        let page_size = page_size.max(1);
        let mut records = Vec::new();
        let mut token: Option<PageToken> = None;

        loop {
            let page = self.scan_page(owner_id, token.as_ref(), page_size).await?;
            let fetched = page.records.len();
            records.extend(page.records);

            match page.next {
                Some(next) if fetched == 0 || token.as_ref() == Some(&next) => {
                    return Err(MemoryError::storage(format!(
                        "pagination stalled for owner {owner_id}"
                    )));
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}

/// Error for a record whose embedding length disagrees with its partition.
pub(crate) fn dimension_mismatch(record: &MemoryRecord, expected: usize) -> MemoryError {
    MemoryError::validation(format!(
        "record {} has {} dimensions but owner {} already stores {expected}-dimension vectors from model {}",
        record.record_id,
        record.embedding.len(),
        record.owner_id,
        record.model
    ))
}

/// Owner-partitioned records shared by the in-process backends.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Partitions {
    by_owner: BTreeMap<String, Vec<MemoryRecord>>,
    #[serde(skip)]
    ids: HashSet<String>,
}

impl Partitions {
    /// Rebuild the id index after deserializing.
    pub(crate) fn reindex(&mut self) -> Result<()> {
        self.ids.clear();
        for record in self.by_owner.values().flatten() {
            if !self.ids.insert(record.record_id.clone()) {
                return Err(MemoryError::storage(format!(
                    "duplicate record id {} in store",
                    record.record_id
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, record: MemoryRecord) -> Result<()> {
        if record.owner_id.trim().is_empty() {
            return Err(MemoryError::validation("owner_id must not be empty"));
        }
        if !record.embedding.is_empty() {
            if let Some(expected) = self.dimension(&record.owner_id, &record.model) {
                if expected != record.embedding.len() {
                    return Err(dimension_mismatch(&record, expected));
                }
            }
        }
        if !self.ids.insert(record.record_id.clone()) {
            return Err(MemoryError::storage(format!(
                "record {} already exists",
                record.record_id
            )));
        }
        self.by_owner
            .entry(record.owner_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Embedding length of the owner's first non-empty record from `model`.
    fn dimension(&self, owner_id: &str, model: &str) -> Option<usize> {
        self.by_owner
            .get(owner_id)?
            .iter()
            .find(|r| r.model == model && !r.embedding.is_empty())
            .map(|r| r.embedding.len())
    }

    /// Undo the most recent [`insert`](Self::insert) for `record`.
    pub(crate) fn rollback(&mut self, record_id: &str, owner_id: &str) {
        if let Some(records) = self.by_owner.get_mut(owner_id) {
            if records.last().map(|r| r.record_id.as_str()) == Some(record_id) {
                records.pop();
            }
            if records.is_empty() {
                self.by_owner.remove(owner_id);
            }
        }
        self.ids.remove(record_id);
    }

    pub(crate) fn page(
        &self,
        owner_id: &str,
        after: Option<&PageToken>,
        limit: usize,
    ) -> Result<Page> {
        let start = match after {
            Some(token) => token.parse::<usize>()?,
            None => 0,
        };
        let records = self.by_owner.get(owner_id).map(Vec::as_slice).unwrap_or(&[]);
        if start >= records.len() {
            return Ok(Page::default());
        }

        let end = start.saturating_add(limit).min(records.len());
        let next = (end < records.len()).then(|| PageToken::new(end));
        Ok(Page {
            records: records[start..end].to_vec(),
            next,
        })
    }

    pub(crate) fn count(&self, owner_id: &str) -> usize {
        self.by_owner.get(owner_id).map_or(0, Vec::len)
    }
}
