use crate::core::error::RateError;
use crate::core::rates::{CachedRates, RateTable, apply_overrides, missing_codes};
use crate::store::BlobStore;
use anyhow::anyhow;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

const CACHE_KEY: &str = "fx_rates";

/// Timestamped rate-table cache over a blob store.
///
/// Strictly an optimization layer: `load` fails open (absent) on anything
/// suspicious, and callers are expected to log and ignore `store` failures.
pub struct RateCache {
    store: Arc<dyn BlobStore>,
    overrides: HashMap<String, f64>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(store: Arc<dyn BlobStore>, overrides: HashMap<String, f64>, ttl: Duration) -> Self {
        Self {
            store,
            overrides,
            ttl,
        }
    }

    /// Returns cached rates only if present, within TTL and, after applying
    /// overrides, complete for every required currency. Completeness is
    /// re-checked against the set required *now*, not the one at write time.
    ///
    /// `Ok(None)` means absent/expired/incomplete; `Err` means the stored
    /// blob could not be read, which callers treat the same way.
    pub fn load(&self, required: &HashSet<String>) -> Result<Option<CachedRates>, RateError> {
        let raw = self
            .store
            .get(CACHE_KEY)
            .map_err(RateError::CacheReadCorrupt)?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let mut cached: CachedRates = serde_json::from_str(&raw)
            .map_err(|e| RateError::CacheReadCorrupt(anyhow!("invalid cache entry: {e}")))?;

        let age = Utc::now() - cached.fetched_at;
        if age > self.ttl || age < Duration::zero() {
            debug!(age_minutes = age.num_minutes(), "Rate cache expired");
            return Ok(None);
        }

        apply_overrides(&mut cached.rates, &self.overrides);
        let missing = missing_codes(&cached.rates, required);
        if !missing.is_empty() {
            debug!(?missing, "Rate cache incomplete for required currencies");
            return Ok(None);
        }

        debug!(provider = %cached.provider, "Rate cache hit");
        Ok(Some(cached))
    }

    /// Overwrites any prior entry wholesale with a fresh timestamp.
    pub fn store(&self, rates: &RateTable, provider: &str) -> Result<(), RateError> {
        let entry = CachedRates {
            rates: rates.clone(),
            provider: provider.to_string(),
            fetched_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| RateError::CacheWriteFailed(anyhow!("serialize cache entry: {e}")))?;
        self.store
            .put(CACHE_KEY, &json)
            .map_err(RateError::CacheWriteFailed)?;
        debug!(provider, "Rate cache updated");
        Ok(())
    }
}
