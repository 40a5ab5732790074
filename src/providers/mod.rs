pub mod chain;
pub mod currency_api;
pub mod er_api;
pub mod frankfurter;

use crate::core::error::RateError;
use crate::core::rates::{PIVOT_CURRENCY, RateTable, is_valid_rate, normalize_code};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A single external source of USD-based exchange rates.
///
/// Implementations own the provider-specific response shape and return a
/// uniform rate table; ordering and fallback live in [`chain`].
#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_rates(&self) -> Result<RateTable, RateError>;
}

// Hung provider requests would otherwise stall the whole chain.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_client(provider: &'static str) -> Result<reqwest::Client, RateError> {
    reqwest::Client::builder()
        .user_agent(concat!("tripwon/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| RateError::ProviderUnreachable {
            provider,
            source: e,
        })
}

/// Uppercases codes, drops non-finite or non-positive rates and pins the
/// pivot currency to exactly 1.
pub(crate) fn sanitize_table(raw: HashMap<String, f64>) -> RateTable {
    let mut rates: RateTable = raw
        .into_iter()
        .filter(|(_, rate)| is_valid_rate(*rate))
        .map(|(code, rate)| (normalize_code(&code), rate))
        .collect();
    rates.insert(PIVOT_CURRENCY.to_string(), 1.0);
    rates
}
