use async_trait::async_trait;
use hashmesh_types::{ContentHash, HashedObject};
use serde_json::Value;

use crate::error::SourceResult;

/// A storage backend able to return the object stored under a hash.
///
/// - Returns `Ok(None)` when the backend does not hold the object.
/// - Returns `Err` when the backend could not answer (network, decode, I/O).
/// - Bounding latency is the implementation's job; callers impose no timeout.
#[async_trait]
pub trait Source: Send + Sync {
    async fn get(&self, hash: &ContentHash) -> SourceResult<Option<Value>>;
}

/// A writable source used as the local, authoritative cache.
#[async_trait]
pub trait CacheStore: Source {
    /// Store `object` under `object.id` exactly. Idempotent.
    async fn put(&self, object: &HashedObject) -> SourceResult<()>;
}
