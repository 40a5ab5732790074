use super::currency_api::CurrencyApiProvider;
use super::er_api::ErApiProvider;
use super::frankfurter::FrankfurterProvider;
use super::RateProvider;
use crate::config::ProvidersConfig;
use crate::core::error::RateError;
use crate::core::rates::{RateTable, apply_overrides, missing_codes};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Ordered list of rate providers, tried strictly in priority order.
///
/// One request in flight at a time; a provider is never retried within a
/// single resolution. A table that is still incomplete after overrides counts
/// as a provider failure and advances the chain.
pub struct RateProviderChain {
    providers: Vec<Box<dyn RateProvider>>,
    overrides: HashMap<String, f64>,
}

impl RateProviderChain {
    pub fn new(providers: Vec<Box<dyn RateProvider>>, overrides: HashMap<String, f64>) -> Self {
        Self {
            providers,
            overrides,
        }
    }

    /// Builds the reference deployment: frankfurter, then er-api, then
    /// currency-api.
    pub fn from_config(config: &ProvidersConfig, overrides: HashMap<String, f64>) -> Self {
        let providers: Vec<Box<dyn RateProvider>> = vec![
            Box::new(FrankfurterProvider::new(&config.frankfurter.base_url)),
            Box::new(ErApiProvider::new(&config.er_api.base_url)),
            Box::new(CurrencyApiProvider::new(&config.currency_api.base_url)),
        ];
        Self::new(providers, overrides)
    }

    /// Returns the first complete rate table along with the name of the
    /// provider that produced it, or `AllProvidersExhausted` carrying the
    /// last failure.
    pub async fn fetch_first_success(
        &self,
        required: &HashSet<String>,
    ) -> Result<(RateTable, String), RateError> {
        let mut last_error = RateError::ProviderShapeInvalid {
            provider: "none",
            detail: "no providers configured".to_string(),
        };

        for provider in &self.providers {
            match provider.fetch_rates().await {
                Ok(mut rates) => {
                    apply_overrides(&mut rates, &self.overrides);
                    let missing = missing_codes(&rates, required);
                    if missing.is_empty() {
                        debug!(provider = provider.name(), "Rate fetch succeeded");
                        return Ok((rates, provider.name().to_string()));
                    }
                    warn!(
                        provider = provider.name(),
                        missing = missing.join(", "),
                        "Rate table incomplete, trying next provider"
                    );
                    last_error = RateError::ProviderShapeInvalid {
                        provider: provider.name(),
                        detail: format!("missing rates for {}", missing.join(", ")),
                    };
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Rate provider failed, trying next"
                    );
                    last_error = e;
                }
            }
        }

        Err(RateError::AllProvidersExhausted {
            last: Box::new(last_error),
        })
    }
}
