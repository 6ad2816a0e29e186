//! In-memory known-source index.
//!
//! [`InMemoryKnownSources`] keeps every record in a `HashMap` behind a
//! `RwLock`. Critical sections touch a single record, so concurrent
//! resolutions of different hashes never wait on each other for long.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use hashmesh_types::{BackendId, ContentHash};
use tracing::trace;

use crate::error::{KnownError, KnownResult};
use crate::traits::KnownSources;

/// An in-memory implementation of [`KnownSources`].
///
/// Data lives for the lifetime of the value and is never persisted.
pub struct InMemoryKnownSources {
    own: BackendId,
    records: RwLock<HashMap<ContentHash, Vec<BackendId>>>,
}

impl InMemoryKnownSources {
    /// Create an empty index for the backend named `own`.
    pub fn new(own: BackendId) -> Self {
        Self {
            own,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Backends recorded for `hash`.
    pub fn lookup(&self, hash: &ContentHash) -> KnownResult<Option<Vec<BackendId>>> {
        let records = self.records.read().map_err(|_| KnownError::Poisoned)?;
        Ok(records.get(hash).cloned())
    }

    /// Append every id of `ids` not already recorded for `hash`.
    pub fn merge(&self, hash: &ContentHash, ids: &[BackendId]) -> KnownResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut records = self.records.write().map_err(|_| KnownError::Poisoned)?;
        let record = records.entry(hash.clone()).or_default();
        for id in ids {
            if !record.contains(id) {
                record.push(id.clone());
            }
        }
        trace!(hash = %hash, sources = record.len(), "merged known sources");
        Ok(())
    }

    /// Drop `id` from the record for `hash`, and the record once it is empty.
    pub fn evict(&self, hash: &ContentHash, id: &BackendId) -> KnownResult<()> {
        let mut records = self.records.write().map_err(|_| KnownError::Poisoned)?;
        if let Some(record) = records.get_mut(hash) {
            record.retain(|known| known != id);
            if record.is_empty() {
                records.remove(hash);
            }
        }
        Ok(())
    }

    /// Number of hashes with at least one known source.
    pub fn len(&self) -> KnownResult<usize> {
        let records = self.records.read().map_err(|_| KnownError::Poisoned)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> KnownResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted list of every hash with a record.
    pub fn hashes(&self) -> KnownResult<Vec<ContentHash>> {
        let records = self.records.read().map_err(|_| KnownError::Poisoned)?;
        let mut hashes: Vec<ContentHash> = records.keys().cloned().collect();
        hashes.sort();
        Ok(hashes)
    }
}

#[async_trait]
impl KnownSources for InMemoryKnownSources {
    async fn own_source(&self) -> KnownResult<BackendId> {
        Ok(self.own.clone())
    }

    async fn known_sources(&self, hash: &ContentHash) -> KnownResult<Option<Vec<BackendId>>> {
        self.lookup(hash)
    }

    async fn add_known_sources(&self, hash: &ContentHash, ids: &[BackendId]) -> KnownResult<()> {
        self.merge(hash, ids)
    }

    async fn remove_known_source(&self, hash: &ContentHash, id: &BackendId) -> KnownResult<()> {
        self.evict(hash, id)
    }
}

impl std::fmt::Debug for InMemoryKnownSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKnownSources")
            .field("own", &self.own)
            .field("record_count", &self.len().ok())
            .finish()
    }
}
