pub mod disk;
pub mod memory;

use anyhow::Result;

/// A persistent string-keyed blob store. Values are JSON documents owned by
/// the caller; the store never interprets them.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
