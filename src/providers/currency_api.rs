use super::{RateProvider, build_client, sanitize_table};
use crate::core::error::RateError;
use crate::core::rates::RateTable;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const NAME: &str = "currency-api";

/// CDN-hosted daily rates from the fawazahmed0 currency-api dataset.
/// The table sits under a lowercase `usd` field with lowercase codes.
pub struct CurrencyApiProvider {
    base_url: String,
}

impl CurrencyApiProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrencyApiResponse {
    usd: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for CurrencyApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_rates(&self) -> Result<RateTable, RateError> {
        let url = format!("{}/v1/currencies/usd.json", self.base_url);
        debug!("Requesting rates from {url}");

        let client = build_client(NAME)?;
        let response = client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RateError::ProviderUnreachable {
                provider: NAME,
                source: e,
            })?;

        let data: CurrencyApiResponse =
            response
                .json()
                .await
                .map_err(|e| RateError::ProviderShapeInvalid {
                    provider: NAME,
                    detail: e.to_string(),
                })?;

        if data.usd.is_empty() {
            return Err(RateError::ProviderShapeInvalid {
                provider: NAME,
                detail: "empty rate table".to_string(),
            });
        }

        Ok(sanitize_table(data.usd))
    }
}
