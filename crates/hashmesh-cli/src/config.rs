use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use hashmesh_known::InMemoryKnownSources;
use hashmesh_resolver::{CachedResolver, MultiSourceResolver, ResolverConfig};
use hashmesh_source::{DiscoverableSource, FieldLinks, FsSource, PatternRegistry};
use hashmesh_types::BackendId;
use serde::{Deserialize, Serialize};

/// Contents of `hashmesh.toml`.
///
/// ```toml
/// own_id = "cache"
/// cache_dir = ".hashmesh/cache"
///
/// [resolver]
/// default_target = "prefer-local"
///
/// [[backends]]
/// id = "local"
/// dir = ".hashmesh/local"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliConfig {
    pub own_id: BackendId,
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    pub id: BackendId,
    pub dir: PathBuf,
}

impl CliConfig {
    /// Load from `path`; relative directories are taken relative to the
    /// file's own directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: CliConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.cache_dir = base.join(&config.cache_dir);
        for backend in &mut config.backends {
            backend.dir = base.join(&backend.dir);
        }
        Ok(config)
    }
}

/// A running node: cache, backends, and the index they share.
pub struct Node {
    pub resolver: CachedResolver<FsSource>,
    pub local_index: Arc<InMemoryKnownSources>,
}

impl Node {
    pub async fn build(config: &CliConfig) -> anyhow::Result<Self> {
        let cache = FsSource::open(&config.cache_dir)
            .await
            .with_context(|| format!("opening cache {}", config.cache_dir.display()))?;

        let mut sources = Vec::with_capacity(config.backends.len());
        for backend in &config.backends {
            let source = FsSource::open(&backend.dir)
                .await
                .with_context(|| format!("opening backend {}", backend.id))?;
            sources.push(DiscoverableSource::new(
                Arc::new(source),
                Arc::new(InMemoryKnownSources::new(backend.id.clone())),
            ));
        }

        let local_index = Arc::new(InMemoryKnownSources::new(config.own_id.clone()));
        let registry = PatternRegistry::new().with(Arc::new(FieldLinks::text_node()));
        let remote = MultiSourceResolver::new(
            registry,
            local_index.clone(),
            sources,
            config.resolver.clone(),
        );
        let resolver = CachedResolver::new(Arc::new(cache), Arc::new(remote));
        resolver.ready().await?;
        Ok(Self {
            resolver,
            local_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashmesh_resolver::TargetPolicy;

    const SAMPLE: &str = r#"
own_id = "cache"
cache_dir = "cache"

[resolver]
default_target = "first"

[[backends]]
id = "local"
dir = "local"

[[backends]]
id = "https://mirror"
dir = "mirror"
"#;

    #[test]
    fn load_resolves_relative_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashmesh.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.own_id.as_str(), "cache");
        assert_eq!(config.cache_dir, dir.path().join("cache"));
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1].dir, dir.path().join("mirror"));
        assert_eq!(config.resolver.default_target, TargetPolicy::First);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[tokio::test]
    async fn build_node_opens_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashmesh.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = CliConfig::load(&path).unwrap();
        let node = Node::build(&config).await.unwrap();
        assert!(dir.path().join("local").is_dir());
        assert!(dir.path().join("mirror").is_dir());
        assert_eq!(node.resolver.resolver().all_sources().await.unwrap().len(), 2);
        assert!(node.local_index.is_empty().unwrap());
    }
}
