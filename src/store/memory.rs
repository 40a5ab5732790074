use crate::store::BlobStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory blob store used for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.inner.read().unwrap();
        let value = map.get(key).cloned();
        if value.is_some() {
            debug!("Store GET hit for key: {key}");
        } else {
            debug!("Store GET miss for key: {key}");
        }
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        debug!("Store PUT for key: {key}");
        let mut map = self.inner.write().unwrap();
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!("Store REMOVE for key: {key}");
        let mut map = self.inner.write().unwrap();
        map.remove(key);
        Ok(())
    }
}
