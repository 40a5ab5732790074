use super::{RateProvider, build_client, sanitize_table};
use crate::core::error::RateError;
use crate::core::rates::{PIVOT_CURRENCY, RateTable};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const NAME: &str = "er-api";

/// Open-access rates from open.er-api.com. Errors are reported in-band via
/// the `result` field, so a 200 response can still be a failure.
pub struct ErApiProvider {
    base_url: String,
}

impl ErApiProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErApiResponse {
    result: String,
    rates: Option<HashMap<String, f64>>,
}

#[async_trait]
impl RateProvider for ErApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_rates(&self) -> Result<RateTable, RateError> {
        let url = format!("{}/v6/latest/{PIVOT_CURRENCY}", self.base_url);
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

        let data: ErApiResponse =
            response
                .json()
                .await
                .map_err(|e| RateError::ProviderShapeInvalid {
                    provider: NAME,
                    detail: e.to_string(),
                })?;

        if data.result != "success" {
            return Err(RateError::ProviderShapeInvalid {
                provider: NAME,
                detail: format!("result = {}", data.result),
            });
        }

        let rates = data
            .rates
            .filter(|r| !r.is_empty())
            .ok_or_else(|| RateError::ProviderShapeInvalid {
                provider: NAME,
                detail: "missing rate table".to_string(),
            })?;

        Ok(sanitize_table(rates))
    }
}
