//! Filesystem source.
//!
//! [`FsSource`] stores each object as `<hash>.json` in one directory. Every
//! write goes to its own temporary file that is renamed into place, so
//! readers never see a partially written object and concurrent writers of
//! one hash do not step on each other.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hashmesh_types::{ContentHash, HashedObject};
use serde_json::Value;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::traits::{CacheStore, Source};

/// Directory-backed source holding one JSON file per object.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    /// Open (and create if needed) the directory at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> SourceResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hash `object` with BLAKE3 over its JSON encoding and store it.
    pub async fn insert(&self, object: Value) -> SourceResult<HashedObject> {
        let hashed = HashedObject::derive(object)?;
        self.put(&hashed).await?;
        Ok(hashed)
    }

    fn path_for(&self, hash: &ContentHash) -> SourceResult<PathBuf> {
        let name = hash.as_str();
        let unsafe_name = name.starts_with('.')
            || name
                .chars()
                .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
        if unsafe_name {
            return Err(SourceError::InvalidHash {
                hash: hash.clone(),
                reason: "not usable as a file name".into(),
            });
        }
        Ok(self.root.join(format!("{name}.json")))
    }
}

#[async_trait]
impl Source for FsSource {
    async fn get(&self, hash: &ContentHash) -> SourceResult<Option<Value>> {
        let path = self.path_for(hash)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStore for FsSource {
    async fn put(&self, object: &HashedObject) -> SourceResult<()> {
        let path = self.path_for(&object.id)?;
        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }
        let bytes = serde_json::to_vec_pretty(&object.object)?;
        let root = self.root.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&root, &target, &bytes))
            .await
            .map_err(std::io::Error::other)??;
        debug!(hash = %object.id, path = %path.display(), "stored object");
        Ok(())
    }
}

/// Write `bytes` to a fresh temporary file in `root` and rename it onto
/// `path`. Temporary names start with a dot and never collide with objects.
fn write_atomically(root: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(root)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    match tmp.persist(path) {
        Ok(_) => Ok(()),
        // Another writer already placed identical content.
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.error),
    }
}
