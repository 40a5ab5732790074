use crate::core::cache::RateCache;
use crate::core::error::RateError;
use crate::core::rates::{ResolvedRates, normalize_code};
use crate::providers::chain::RateProviderChain;
use std::collections::HashSet;
use tracing::warn;

/// Orchestrates cache-then-fetch rate resolution.
///
/// The returned table is guaranteed to contain a valid rate for every
/// requested currency plus the home currency. Cache failures in either
/// direction are logged and ignored; only provider exhaustion propagates.
pub struct RateResolver {
    cache: RateCache,
    chain: RateProviderChain,
    home_currency: String,
}

impl RateResolver {
    pub fn new(cache: RateCache, chain: RateProviderChain, home_currency: &str) -> Self {
        Self {
            cache,
            chain,
            home_currency: normalize_code(home_currency),
        }
    }

    pub fn home_currency(&self) -> &str {
        &self.home_currency
    }

    pub async fn resolve(&self, required_currencies: &[&str]) -> Result<ResolvedRates, RateError> {
        let mut required: HashSet<String> = required_currencies
            .iter()
            .map(|code| normalize_code(code))
            .filter(|code| !code.is_empty())
            .collect();
        required.insert(self.home_currency.clone());

        match self.cache.load(&required) {
            Ok(Some(cached)) => {
                // Suffix is informational only, never a provider identity.
                return Ok(ResolvedRates {
                    rates: cached.rates,
                    provider: format!("{} (cached)", cached.provider),
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Rate cache unreadable, refetching"),
        }

        let (rates, provider) = self.chain.fetch_first_success(&required).await?;

        // Best-effort write-back; a store failure must not fail the resolve.
        if let Err(e) = self.cache.store(&rates, &provider) {
            warn!(error = %e, "Failed to persist rate cache");
        }

        Ok(ResolvedRates { rates, provider })
    }
}
