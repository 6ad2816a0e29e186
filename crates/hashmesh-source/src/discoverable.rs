use std::fmt;
use std::sync::Arc;

use hashmesh_known::KnownSources;

use crate::traits::Source;

/// A source paired with its own known-source index.
///
/// Resolvers read the index to learn where the children of an object
/// fetched from this source live. They never write to it.
pub struct DiscoverableSource<S: ?Sized = dyn Source> {
    pub source: Arc<S>,
    pub known_sources: Arc<dyn KnownSources>,
}

impl<S: ?Sized> DiscoverableSource<S> {
    pub fn new(source: Arc<S>, known_sources: Arc<dyn KnownSources>) -> Self {
        Self {
            source,
            known_sources,
        }
    }
}

impl<S: ?Sized> Clone for DiscoverableSource<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            known_sources: Arc::clone(&self.known_sources),
        }
    }
}

impl<S: ?Sized> fmt::Debug for DiscoverableSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoverableSource").finish_non_exhaustive()
    }
}
