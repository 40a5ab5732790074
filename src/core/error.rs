use thiserror::Error;

/// Failures of the exchange-rate resolution pipeline.
///
/// Cache variants are advisory: callers log them and fall through to a fresh
/// fetch. Only `AllProvidersExhausted` surfaces to the user.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("rate provider {provider} unreachable: {source}")]
    ProviderUnreachable {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("rate provider {provider} returned an invalid response: {detail}")]
    ProviderShapeInvalid {
        provider: &'static str,
        detail: String,
    },

    #[error("all rate sources exhausted: {last}")]
    AllProvidersExhausted {
        #[source]
        last: Box<RateError>,
    },

    #[error("no valid exchange rate for {0}")]
    RateUnavailable(String),

    #[error("cached rates unreadable: {0}")]
    CacheReadCorrupt(#[source] anyhow::Error),

    #[error("failed to persist rate cache: {0}")]
    CacheWriteFailed(#[source] anyhow::Error),
}
