use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use hashmesh_types::{ContentHash, HashedObject};
use serde_json::Value;

use crate::error::{SourceError, SourceResult};
use crate::traits::{CacheStore, Source};

/// In-memory, HashMap-based source.
///
/// Intended for tests, embedding, and as a process-local cache. Objects are
/// held behind a `RwLock` and cloned on read and write.
pub struct InMemorySource {
    objects: RwLock<HashMap<ContentHash, Value>>,
}

impl InMemorySource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Hash `object` with BLAKE3 over its JSON encoding and store it.
    pub fn insert(&self, object: Value) -> SourceResult<HashedObject> {
        let hashed = HashedObject::derive(object)?;
        self.store(&hashed)?;
        Ok(hashed)
    }

    /// Store `object` under a hash assigned elsewhere.
    pub fn insert_with_hash(&self, hash: ContentHash, object: Value) -> SourceResult<()> {
        self.store(&HashedObject::new(hash, object))
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.objects
            .read()
            .map(|m| m.contains_key(hash))
            .unwrap_or(false)
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the source is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, object: &HashedObject) -> SourceResult<()> {
        let mut map = self.write_lock()?;
        // Idempotent: content addressing means an existing entry is identical.
        map.entry(object.id.clone())
            .or_insert_with(|| object.object.clone());
        Ok(())
    }

    fn write_lock(
        &self,
    ) -> SourceResult<std::sync::RwLockWriteGuard<'_, HashMap<ContentHash, Value>>> {
        self.objects
            .write()
            .map_err(|_| SourceError::Unavailable("lock poisoned".into()))
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn get(&self, hash: &ContentHash) -> SourceResult<Option<Value>> {
        let map = self
            .objects
            .read()
            .map_err(|_| SourceError::Unavailable("lock poisoned".into()))?;
        Ok(map.get(hash).cloned())
    }
}

#[async_trait]
impl CacheStore for InMemorySource {
    async fn put(&self, object: &HashedObject) -> SourceResult<()> {
        self.store(object)
    }
}

impl std::fmt::Debug for InMemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySource")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_and_get() {
        let source = InMemorySource::new();
        let hashed = source.insert(json!({"text": "hello"})).unwrap();
        assert_eq!(source.get(&hashed.id).await.unwrap(), Some(json!({"text": "hello"})));
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let source = InMemorySource::new();
        let hash = ContentHash::of_bytes(b"missing");
        assert!(source.get(&hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_keeps_given_hash() {
        let source = InMemorySource::new();
        let hash = ContentHash::new("QmForeignHash").unwrap();
        source.put(&HashedObject::new(hash.clone(), json!(1))).await.unwrap();
        assert_eq!(source.get(&hash).await.unwrap(), Some(json!(1)));
    }

    #[test]
    fn insert_is_idempotent() {
        let source = InMemorySource::new();
        let a = source.insert(json!({"n": 1})).unwrap();
        let b = source.insert(json!({"n": 1})).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn contains_after_insert() {
        let source = InMemorySource::new();
        assert!(source.is_empty());
        let hashed = source.insert(json!("x")).unwrap();
        assert!(source.contains(&hashed.id));
        assert!(!source.contains(&ContentHash::of_bytes(b"other")));
    }

    #[test]
    fn debug_format() {
        let source = InMemorySource::default();
        let debug = format!("{source:?}");
        assert!(debug.contains("InMemorySource"));
        assert!(debug.contains("object_count"));
    }
}
