// File: fitroom-core/src/storage.rs

use std::path::{Component, Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use fitroom_common::traits::storage_traits::BlobStore;

use crate::Error;

/// Blob store rooted at a local directory. Keys are relative, slash-separated paths.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(key);
        let clean = !key.is_empty()
            && !key.contains('\\')
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(Error::InvalidInput(format!("invalid storage key: {key:?}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("object {key}")))
            }
            Err(e) => Err(Error::Storage(format!("read {key}: {e}"))),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create {}: {e}", parent.display())))?;
        }

        // Readers never observe a partially written object.
        let tmp = path.with_extension("partial");
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| Error::Storage(format!("write {key}: {e}")))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::Storage(format!("commit {key}: {e}")))?;

        debug!(key, mime_type, size = bytes.len(), "stored object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("delete {key}: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn put_get_delete() -> Result<(), Error> {
        let dir = TempDir::new()?;
        let store = LocalBlobStore::new(dir.path());

        store.put("tryons/abc.jpg", b"jpeg-bytes", "image/jpeg").await?;
        assert_eq!(store.get("tryons/abc.jpg").await?, b"jpeg-bytes");

        store.put("tryons/abc.jpg", b"newer", "image/jpeg").await?;
        assert_eq!(store.get("tryons/abc.jpg").await?, b"newer");

        store.delete("tryons/abc.jpg").await?;
        assert!(matches!(store.get("tryons/abc.jpg").await, Err(Error::NotFound(_))));
        store.delete("tryons/abc.jpg").await?;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_escaping_keys() -> Result<(), Error> {
        let dir = TempDir::new()?;
        let store = LocalBlobStore::new(dir.path());

        for key in ["", "../etc/passwd", "/abs/path", "a/../../b", "a\\b", "./a"] {
            assert!(
                matches!(store.get(key).await, Err(Error::InvalidInput(_))),
                "key {key:?} should be rejected"
            );
        }
        Ok(())
    }
}
