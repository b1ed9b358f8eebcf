use async_trait::async_trait;
use crate::error::Error;

/// Object storage keyed by opaque paths. A `put` is visible to the next `get`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns `Error::NotFound` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, Error>;
    async fn put(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<(), Error>;
    async fn delete(&self, key: &str) -> Result<(), Error>;
}
