use crate::core::error::RateError;
use crate::core::rates::{PIVOT_CURRENCY, is_valid_rate, normalize_code};
use crate::core::resolver::RateResolver;
use tracing::debug;

/// Outcome of converting one amount into the home currency.
///
/// `effective_rate` keeps full floating-point precision so the conversion can
/// be recomputed exactly later; only `converted_amount` is rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub converted_amount: f64,
    pub effective_rate: Option<f64>,
    pub provider: String,
}

/// Converts local-currency amounts into the home currency via the resolver.
pub struct ConversionService {
    resolver: RateResolver,
}

impl ConversionService {
    pub fn new(resolver: RateResolver) -> Self {
        Self { resolver }
    }

    pub fn home_currency(&self) -> &str {
        self.resolver.home_currency()
    }

    pub async fn convert(
        &self,
        amount: f64,
        source_currency: &str,
    ) -> Result<ConversionResult, RateError> {
        let source = normalize_code(source_currency);
        let home = self.resolver.home_currency();

        if source.is_empty() || source == home {
            return Ok(ConversionResult {
                converted_amount: round2(amount),
                effective_rate: Some(1.0),
                provider: "self".to_string(),
            });
        }

        let resolved = self.resolver.resolve(&[source.as_str()]).await?;

        // The resolver guarantees completeness; checked anyway so a bad table
        // can never silently produce a zero or infinite amount.
        let usd_to_home = resolved
            .rates
            .get(home)
            .copied()
            .filter(|r| is_valid_rate(*r))
            .ok_or_else(|| RateError::RateUnavailable(home.to_string()))?;

        let effective_rate = if source == PIVOT_CURRENCY {
            usd_to_home
        } else {
            let usd_to_source = resolved
                .rates
                .get(&source)
                .copied()
                .filter(|r| is_valid_rate(*r))
                .ok_or_else(|| RateError::RateUnavailable(source.clone()))?;
            usd_to_home / usd_to_source
        };

        let converted_amount = round2(amount * effective_rate);
        debug!(
            %source,
            rate = effective_rate,
            provider = %resolved.provider,
            "Converted amount"
        );

        Ok(ConversionResult {
            converted_amount,
            effective_rate: Some(effective_rate),
            provider: resolved.provider,
        })
    }
}

/// Rounds to 2 decimal places, ties away from zero (the tie-break of
/// `f64::round` on the value scaled by 100). Applied once to final amounts,
/// never to intermediate rates. Non-finite input collapses to zero.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::RateCache;
    use crate::core::rates::RateTable;
    use crate::providers::RateProvider;
    use crate::providers::chain::RateProviderChain;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        rates: RateTable,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RateProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_rates(&self) -> Result<RateTable, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rates.clone())
        }
    }

    fn service(entries: &[(&str, f64)]) -> (ConversionService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FixedProvider {
            rates: entries.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
            calls: Arc::clone(&calls),
        };
        let cache = RateCache::new(
            Arc::new(MemoryStore::new()),
            HashMap::new(),
            Duration::hours(6),
        );
        let chain = RateProviderChain::new(vec![Box::new(provider)], HashMap::new());
        let resolver = RateResolver::new(cache, chain, "KRW");
        (ConversionService::new(resolver), calls)
    }

    const RATES: &[(&str, f64)] = &[("USD", 1.0), ("KRW", 1350.0), ("EUR", 0.9)];

    #[tokio::test]
    async fn test_self_conversion_skips_resolution() {
        let (service, calls) = service(RATES);

        let result = service.convert(123.456, "KRW").await.unwrap();

        assert_eq!(result.converted_amount, 123.46);
        assert_eq!(result.effective_rate, Some(1.0));
        assert_eq!(result.provider, "self");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_currency_is_self_conversion() {
        let (service, calls) = service(RATES);

        let result = service.convert(50.0, "").await.unwrap();

        assert_eq!(result.converted_amount, 50.0);
        assert_eq!(result.provider, "self");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pivot_conversion_uses_home_rate_directly() {
        let (service, _) = service(RATES);

        let result = service.convert(2.0, "USD").await.unwrap();

        assert_eq!(result.effective_rate, Some(1350.0));
        assert_eq!(result.converted_amount, 2700.0);
        assert_eq!(result.provider, "fixed");
    }

    #[tokio::test]
    async fn test_cross_rate_through_pivot() {
        let (service, _) = service(RATES);

        let result = service.convert(10.0, "EUR").await.unwrap();

        // 1350 / 0.9 = 1500 KRW per EUR
        assert_eq!(result.effective_rate, Some(1500.0));
        assert_eq!(result.converted_amount, 15000.0);
    }

    #[tokio::test]
    async fn test_lowercase_source_currency() {
        let (service, _) = service(RATES);

        let result = service.convert(10.0, "eur").await.unwrap();
        assert_eq!(result.converted_amount, 15000.0);
    }

    #[test]
    fn test_round2_ties_away_from_zero() {
        // 0.125 is exactly representable in binary, so the tie is real
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn test_round2_basics() {
        assert_eq!(round2(1.004), 1.0);
        assert_eq!(round2(1.006), 1.01);
        assert_eq!(round2(-1.006), -1.01);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(f64::NAN), 0.0);
        assert_eq!(round2(f64::INFINITY), 0.0);
    }
}
