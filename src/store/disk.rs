use crate::store::BlobStore;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

/// Blob store backed by a fjall keyspace on disk.
pub struct DiskStore {
    // Keyspace must outlive the partition handle.
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        let partition = keyspace
            .open_partition("blobs", PartitionCreateOptions::default())
            .context("Failed to open blob partition")?;

        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }
}

impl BlobStore for DiskStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .partition
            .get(key)
            .with_context(|| format!("Failed to read key: {key}"))?;
        match value {
            Some(slice) => {
                debug!("Store GET hit for key: {key}");
                Ok(Some(String::from_utf8(slice.to_vec())?))
            }
            None => {
                debug!("Store GET miss for key: {key}");
                Ok(None)
            }
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        debug!("Store PUT for key: {key}");
        self.partition
            .insert(key, value)
            .with_context(|| format!("Failed to write key: {key}"))
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!("Store REMOVE for key: {key}");
        self.partition
            .remove(key)
            .with_context(|| format!("Failed to remove key: {key}"))
    }
}
