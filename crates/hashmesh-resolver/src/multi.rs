//! Multi-source resolver.
//!
//! Resolves a hash against a set of backends without the caller knowing
//! which one holds it. Each `get` walks not-started → racing →
//! resolved | absent on its own; the only state shared between calls is the
//! local known-source index, and every mutation of it is an idempotent merge
//! or eviction.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use hashmesh_known::KnownSources;
use hashmesh_source::{DiscoverableSource, PatternRegistry, Source};
use hashmesh_types::{BackendId, ContentHash};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::error::{AttemptError, ResolveError, ResolveResult};
use crate::race::race_to_success;

/// Configured backends keyed by their own identifiers.
struct SourceTable<S: ?Sized> {
    order: Vec<BackendId>,
    by_id: HashMap<BackendId, DiscoverableSource<S>>,
}

/// Candidate set a race ran over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Candidates {
    Known,
    Broadcast,
}

/// Resolves content hashes across several discoverable sources.
///
/// `S` is the backend type; domain layers that need more than [`Source`]
/// from their providers keep it concrete, everything else uses the default
/// `dyn Source`.
pub struct MultiSourceResolver<S: ?Sized + Source = dyn Source> {
    registry: PatternRegistry,
    local: Arc<dyn KnownSources>,
    configured: Vec<DiscoverableSource<S>>,
    sources: OnceCell<SourceTable<S>>,
    config: ResolverConfig,
}

impl<S: ?Sized + Source> MultiSourceResolver<S> {
    /// Build a resolver over `sources`.
    ///
    /// Backend identifiers are collected lazily by the first call that needs
    /// them; see [`ready`](Self::ready).
    pub fn new(
        registry: PatternRegistry,
        local: Arc<dyn KnownSources>,
        sources: Vec<DiscoverableSource<S>>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            registry,
            local,
            configured: sources,
            sources: OnceCell::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The index this resolver learns into.
    pub fn local_index(&self) -> &Arc<dyn KnownSources> {
        &self.local
    }

    /// Wait until every source has reported its identifier.
    ///
    /// Concurrent callers share one initialisation. A failed initialisation
    /// is retried by the next caller.
    pub async fn ready(&self) -> ResolveResult<()> {
        self.table().await.map(|_| ())
    }

    /// Identifiers of every configured backend, in configuration order.
    pub async fn all_sources(&self) -> ResolveResult<Vec<BackendId>> {
        Ok(self.table().await?.order.clone())
    }

    /// The backend registered under `id`.
    pub async fn source(&self, id: &BackendId) -> ResolveResult<Arc<S>> {
        self.table()
            .await?
            .by_id
            .get(id)
            .map(|entry| Arc::clone(&entry.source))
            .ok_or_else(|| ResolveError::UnknownBackend(id.clone()))
    }

    /// Retrieve the object stored under `hash` from whichever backend has it.
    ///
    /// Never fails: backend errors only shape the known-source index, and a
    /// resolver that cannot initialise reports every object as absent.
    pub async fn get(&self, hash: &ContentHash) -> Option<Value> {
        let table = match self.table().await {
            Ok(table) => table,
            Err(e) => {
                warn!(hash = %hash, error = %e, "resolver not ready");
                return None;
            }
        };

        let known = match self.local.known_sources(hash).await {
            Ok(known) => known.filter(|ids| !ids.is_empty()),
            Err(e) => {
                warn!(hash = %hash, error = %e, "known-source lookup failed");
                None
            }
        };

        let Some(known) = known else {
            return self.resolve(table, hash, table.order.clone(), Candidates::Broadcast).await;
        };

        let found = self.resolve(table, hash, known, Candidates::Known).await;
        if found.is_none() && self.config.fallback_to_broadcast {
            debug!(hash = %hash, "known sources exhausted, broadcasting");
            return self.resolve(table, hash, table.order.clone(), Candidates::Broadcast).await;
        }
        found
    }

    async fn table(&self) -> ResolveResult<&SourceTable<S>> {
        self.sources.get_or_try_init(|| self.init_sources()).await
    }

    async fn init_sources(&self) -> ResolveResult<SourceTable<S>> {
        let names = join_all(
            self.configured
                .iter()
                .map(|entry| entry.known_sources.own_source()),
        )
        .await;

        let mut table = SourceTable {
            order: Vec::with_capacity(names.len()),
            by_id: HashMap::with_capacity(names.len()),
        };
        for (entry, name) in self.configured.iter().zip(names) {
            let id = name?;
            if table.by_id.contains_key(&id) {
                return Err(ResolveError::DuplicateBackend(id));
            }
            table.order.push(id.clone());
            table.by_id.insert(id, entry.clone());
        }

        info!(backends = table.order.len(), "resolver sources initialised");
        Ok(table)
    }

    async fn resolve(
        &self,
        table: &SourceTable<S>,
        hash: &ContentHash,
        candidates: Vec<BackendId>,
        kind: Candidates,
    ) -> Option<Value> {
        debug!(hash = %hash, candidates = candidates.len(), ?kind, "racing sources");
        let attempts = candidates
            .into_iter()
            .map(|backend| self.attempt(table, hash, backend, kind));

        match race_to_success(attempts).await {
            Ok((backend, payload)) => {
                debug!(hash = %hash, backend = %backend, "resolved");
                if kind == Candidates::Broadcast {
                    self.learn(hash, &backend).await;
                }
                self.discover_links(table, &backend, &payload).await;
                Some(payload)
            }
            Err(exhausted) => {
                debug!(hash = %hash, attempts = exhausted.attempts(), "not found on any source");
                None
            }
        }
    }

    /// Query one candidate. A known source that fails is evicted as soon as
    /// its attempt settles, whether or not another candidate wins the race.
    async fn attempt(
        &self,
        table: &SourceTable<S>,
        hash: &ContentHash,
        backend: BackendId,
        kind: Candidates,
    ) -> Result<(BackendId, Value), AttemptError> {
        let outcome = Self::fetch(table, hash, backend).await;
        if let (Err(failure), Candidates::Known) = (&outcome, kind) {
            self.evict(hash, failure).await;
        }
        outcome
    }

    async fn fetch(
        table: &SourceTable<S>,
        hash: &ContentHash,
        backend: BackendId,
    ) -> Result<(BackendId, Value), AttemptError> {
        let Some(entry) = table.by_id.get(&backend) else {
            return Err(AttemptError::UnknownBackend { backend });
        };
        match entry.source.get(hash).await {
            Ok(Some(payload)) => Ok((backend, payload)),
            Ok(None) => Err(AttemptError::NotFound { backend }),
            Err(e) => Err(AttemptError::Backend {
                backend,
                reason: e.to_string(),
            }),
        }
    }

    async fn learn(&self, hash: &ContentHash, backend: &BackendId) {
        match self
            .local
            .add_known_sources(hash, std::slice::from_ref(backend))
            .await
        {
            Ok(()) => debug!(hash = %hash, backend = %backend, "learned source"),
            Err(e) => warn!(hash = %hash, backend = %backend, error = %e, "failed to record source"),
        }
    }

    async fn evict(&self, hash: &ContentHash, failure: &AttemptError) {
        let backend = failure.backend();
        debug!(hash = %hash, reason = %failure, "evicting stale source");
        if let Err(e) = self.local.remove_known_source(hash, backend).await {
            warn!(hash = %hash, backend = %backend, error = %e, "failed to evict source");
        }
    }

    /// Import what `backend` knows about the objects `payload` links to.
    async fn discover_links(&self, table: &SourceTable<S>, backend: &BackendId, payload: &Value) {
        let links = self.registry.links(payload).await;
        if links.is_empty() {
            return;
        }
        let Some(entry) = table.by_id.get(backend) else {
            return;
        };
        let peer_index = &entry.known_sources;

        join_all(links.iter().map(|link| async move {
            match peer_index.known_sources(link).await {
                Ok(Some(ids)) if !ids.is_empty() => {
                    match self.local.add_known_sources(link, &ids).await {
                        Ok(()) => debug!(
                            link = %link,
                            via = %backend,
                            sources = ids.len(),
                            "imported link sources"
                        ),
                        Err(e) => warn!(link = %link, error = %e, "failed to import link sources"),
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(link = %link, via = %backend, error = %e, "peer index query failed"),
            }
        }))
        .await;
    }
}

impl<S: ?Sized + Source> std::fmt::Debug for MultiSourceResolver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSourceResolver")
            .field("backends", &self.configured.len())
            .field("ready", &self.sources.initialized())
            .field("registry", &self.registry)
            .finish()
    }
}
