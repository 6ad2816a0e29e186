//! Cache-fronted resolver with optimistic creation.
//!
//! The local cache is always asked first and is authoritative for whatever
//! it holds. Remote hits are written through; misses are not cached.

use std::future::Future;
use std::sync::Arc;

use hashmesh_source::{CacheStore, Source, SourceResult};
use hashmesh_types::{BackendId, ContentHash, HashedObject};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::TargetPolicy;
use crate::error::{ResolveError, ResolveResult};
use crate::multi::MultiSourceResolver;
use crate::replication::{ReplicationEvent, ReplicationSink, ReplicationStream};

/// A local cache in front of a [`MultiSourceResolver`].
pub struct CachedResolver<S: ?Sized + Source = dyn Source> {
    cache: Arc<dyn CacheStore>,
    remote: Arc<MultiSourceResolver<S>>,
    replication: ReplicationSink,
}

impl<S: ?Sized + Source> CachedResolver<S> {
    pub fn new(cache: Arc<dyn CacheStore>, remote: Arc<MultiSourceResolver<S>>) -> Self {
        let replication = ReplicationSink::new(remote.config().replication_channel_capacity);
        Self {
            cache,
            remote,
            replication,
        }
    }

    pub fn resolver(&self) -> &Arc<MultiSourceResolver<S>> {
        &self.remote
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// See [`MultiSourceResolver::ready`].
    pub async fn ready(&self) -> ResolveResult<()> {
        self.remote.ready().await
    }

    /// Receive the outcome of every replication started after this call.
    pub fn subscribe_replication(&self) -> ReplicationStream {
        self.replication.subscribe()
    }

    /// Retrieve `hash` from the cache, or from the remote backends on a miss.
    pub async fn get(&self, hash: &ContentHash) -> Option<Value> {
        match self.cache.get(hash).await {
            Ok(Some(payload)) => {
                debug!(hash = %hash, "cache hit");
                return Some(payload);
            }
            Ok(None) => {}
            Err(e) => warn!(hash = %hash, error = %e, "cache read failed, treating as miss"),
        }

        let payload = self.remote.get(hash).await?;
        let hashed = HashedObject::new(hash.clone(), payload);
        if let Err(e) = self.cache.put(&hashed).await {
            warn!(hash = %hash, error = %e, "cache write-through failed");
        }
        Some(hashed.object)
    }
}

impl<S: ?Sized + Source + 'static> CachedResolver<S> {
    /// Create an object on one backend and replicate it to the others.
    ///
    /// `creator` runs on the target backend (`provider_hint`, or the
    /// configured default) and decides the hash. The object is cached before
    /// this returns, so local reads see it at once. `cloner` then runs on
    /// every other backend in detached tasks and must store the object under
    /// the same hash; its outcomes go to the log and to
    /// [`subscribe_replication`](Self::subscribe_replication) and never fail
    /// this call.
    pub async fn optimistic_create_in<C, CFut, L, LFut>(
        &self,
        provider_hint: Option<&BackendId>,
        creator: C,
        cloner: L,
    ) -> ResolveResult<HashedObject>
    where
        C: FnOnce(Arc<S>) -> CFut,
        CFut: Future<Output = SourceResult<HashedObject>>,
        L: Fn(Arc<S>, HashedObject) -> LFut + Clone + Send + 'static,
        LFut: Future<Output = SourceResult<ContentHash>> + Send + 'static,
    {
        let backends = self.remote.all_sources().await?;
        if backends.is_empty() {
            return Err(ResolveError::NoBackends);
        }

        let target = match provider_hint {
            Some(hint) => backends
                .iter()
                .find(|id| *id == hint)
                .ok_or_else(|| ResolveError::UnknownBackend(hint.clone()))?,
            None => {
                let policy = &self.remote.config().default_target;
                policy.select(&backends).ok_or_else(|| match policy {
                    TargetPolicy::Named(name) => ResolveError::UnknownBackend(name.clone()),
                    _ => ResolveError::NoBackends,
                })?
            }
        }
        .clone();

        let target_source = self.remote.source(&target).await?;
        let hashed = creator(target_source)
            .await
            .map_err(|source| ResolveError::Create {
                backend: target.clone(),
                source,
            })?;
        info!(hash = %hashed.id, backend = %target, "created object");

        if let Err(e) = self.cache.put(&hashed).await {
            warn!(hash = %hashed.id, error = %e, "failed to cache created object");
        }

        for backend in backends.into_iter().filter(|id| *id != target) {
            let source = self.remote.source(&backend).await?;
            self.spawn_clone(backend, source, hashed.clone(), cloner.clone());
        }

        Ok(hashed)
    }

    fn spawn_clone<L, LFut>(
        &self,
        backend: BackendId,
        source: Arc<S>,
        object: HashedObject,
        cloner: L,
    ) where
        L: Fn(Arc<S>, HashedObject) -> LFut + Send + 'static,
        LFut: Future<Output = SourceResult<ContentHash>> + Send + 'static,
    {
        let sink = self.replication.clone();
        tokio::spawn(async move {
            let hash = object.id.clone();
            let event = match cloner(source, object).await {
                Ok(stored) if stored == hash => ReplicationEvent::Replicated { hash, backend },
                Ok(stored) => ReplicationEvent::Failed {
                    reason: format!("stored under {stored}, expected {hash}"),
                    hash,
                    backend,
                },
                Err(e) => ReplicationEvent::Failed {
                    hash,
                    backend,
                    reason: e.to_string(),
                },
            };
            sink.record(event);
        });
    }
}

impl<S: ?Sized + Source> std::fmt::Debug for CachedResolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResolver")
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}
