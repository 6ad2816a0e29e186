use async_trait::async_trait;
use hashmesh_types::{BackendId, ContentHash};

use crate::error::KnownResult;

/// Index of the backends believed to hold each content hash.
///
/// Implementations must be safe under concurrent merge and eviction from a
/// resolver's parallel fan-out. Records are insertion ordered and never hold
/// the same backend twice.
#[async_trait]
pub trait KnownSources: Send + Sync {
    /// Identifier of the backend this index belongs to.
    async fn own_source(&self) -> KnownResult<BackendId>;

    /// Backends recorded for `hash`, in insertion order.
    ///
    /// Returns `Ok(None)` when nothing is recorded.
    async fn known_sources(&self, hash: &ContentHash) -> KnownResult<Option<Vec<BackendId>>>;

    /// Union-merge `ids` into the record for `hash`.
    async fn add_known_sources(&self, hash: &ContentHash, ids: &[BackendId]) -> KnownResult<()>;

    /// Remove `id` from the record for `hash`. No-op when absent.
    async fn remove_known_source(&self, hash: &ContentHash, id: &BackendId) -> KnownResult<()>;
}
