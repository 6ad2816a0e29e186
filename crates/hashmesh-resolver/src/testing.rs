//! Scriptable backends for resolver tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hashmesh_known::{InMemoryKnownSources, KnownSources};
use hashmesh_source::{
    DiscoverableSource, FieldLinks, PatternRegistry, Source, SourceError, SourceResult,
};
use hashmesh_types::{BackendId, ContentHash, HashedObject};
use serde_json::Value;

use crate::config::ResolverConfig;
use crate::multi::MultiSourceResolver;

pub(crate) fn id(name: &str) -> BackendId {
    BackendId::new(name).unwrap()
}

pub(crate) fn hash(label: &str) -> ContentHash {
    ContentHash::of_bytes(label.as_bytes())
}

pub(crate) fn index(own: &str) -> Arc<InMemoryKnownSources> {
    Arc::new(InMemoryKnownSources::new(id(own)))
}

pub(crate) fn registry() -> PatternRegistry {
    PatternRegistry::new().with(Arc::new(FieldLinks::text_node()))
}

/// Resolver over `sources` with a fresh local index, returned alongside.
pub(crate) fn resolver(
    sources: Vec<DiscoverableSource>,
) -> (MultiSourceResolver, Arc<InMemoryKnownSources>) {
    let local = index("local");
    let resolver = MultiSourceResolver::new(
        registry(),
        local.clone(),
        sources,
        ResolverConfig::default(),
    );
    (resolver, local)
}

/// Backend with adjustable latency and failure, counting every `get`.
///
/// Doubles as a typed provider: `create` assigns a hash the way a real
/// backend would, `clone_in` stores under a given hash.
pub(crate) struct TestBackend {
    pub(crate) id: BackendId,
    pub(crate) index: Arc<InMemoryKnownSources>,
    objects: Mutex<HashMap<ContentHash, Value>>,
    delay: Mutex<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl TestBackend {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id(name),
            index: index(name),
            objects: Mutex::new(HashMap::new()),
            delay: Mutex::new(Duration::ZERO),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn hold(&self, hash: &ContentHash, payload: Value) {
        self.objects
            .lock()
            .unwrap()
            .insert(hash.clone(), payload);
    }

    pub(crate) fn has(&self, hash: &ContentHash) -> bool {
        self.objects.lock().unwrap().contains_key(hash)
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn source(self: &Arc<Self>) -> Arc<dyn Source> {
        Arc::clone(self) as Arc<dyn Source>
    }

    pub(crate) fn discoverable(self: &Arc<Self>) -> DiscoverableSource {
        DiscoverableSource::new(self.source(), self.known())
    }

    pub(crate) fn typed(self: &Arc<Self>) -> DiscoverableSource<TestBackend> {
        DiscoverableSource::new(Arc::clone(self), self.known())
    }

    fn known(&self) -> Arc<dyn KnownSources> {
        Arc::clone(&self.index) as Arc<dyn KnownSources>
    }

    /// Store `payload` under a hash this backend computes.
    pub(crate) async fn create(&self, payload: Value) -> SourceResult<HashedObject> {
        self.check().await?;
        let hashed = HashedObject::derive(payload)?;
        self.hold(&hashed.id, hashed.object.clone());
        Ok(hashed)
    }

    /// Store `object` under its existing hash.
    pub(crate) async fn clone_in(&self, object: &HashedObject) -> SourceResult<ContentHash> {
        self.check().await?;
        self.hold(&object.id, object.object.clone());
        Ok(object.id.clone())
    }

    async fn check(&self) -> SourceResult<()> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable(format!("{} is down", self.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Source for TestBackend {
    async fn get(&self, hash: &ContentHash) -> SourceResult<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check().await?;
        Ok(self.objects.lock().unwrap().get(hash).cloned())
    }
}
