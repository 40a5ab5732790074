use super::{RateProvider, build_client, sanitize_table};
use crate::core::error::RateError;
use crate::core::rates::{PIVOT_CURRENCY, RateTable};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

const NAME: &str = "frankfurter";

/// ECB-sourced rates from frankfurter.app.
pub struct FrankfurterProvider {
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    base: String,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch_rates(&self) -> Result<RateTable, RateError> {
        let url = format!("{}/latest?base={PIVOT_CURRENCY}", self.base_url);
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

        let data: FrankfurterResponse =
            response
                .json()
                .await
                .map_err(|e| RateError::ProviderShapeInvalid {
                    provider: NAME,
                    detail: e.to_string(),
                })?;

        if data.base != PIVOT_CURRENCY {
            return Err(RateError::ProviderShapeInvalid {
                provider: NAME,
                detail: format!("unexpected base currency: {}", data.base),
            });
        }
        if data.rates.is_empty() {
            return Err(RateError::ProviderShapeInvalid {
                provider: NAME,
                detail: "empty rate table".to_string(),
            });
        }

        Ok(sanitize_table(data.rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_server(body: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_fetch_rates() {
        let body = r#"{"base":"USD","date":"2026-08-25","rates":{"EUR":0.9,"KRW":1388.2}}"#;
        let server = mock_server(body, 200).await;
        let provider = FrankfurterProvider::new(&server.uri());

        let rates = provider.fetch_rates().await.unwrap();

        assert_eq!(rates["EUR"], 0.9);
        assert_eq!(rates["KRW"], 1388.2);
        assert_eq!(rates["USD"], 1.0);
    }

    #[tokio::test]
    async fn test_wrong_base_is_shape_error() {
        let body = r#"{"base":"EUR","rates":{"KRW":1540.0}}"#;
        let server = mock_server(body, 200).await;
        let provider = FrankfurterProvider::new(&server.uri());

        let err = provider.fetch_rates().await.unwrap_err();
        assert!(matches!(err, RateError::ProviderShapeInvalid { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_shape_error() {
        let server = mock_server("<html>oops</html>", 200).await;
        let provider = FrankfurterProvider::new(&server.uri());

        let err = provider.fetch_rates().await.unwrap_err();
        assert!(matches!(err, RateError::ProviderShapeInvalid { .. }));
    }

    #[tokio::test]
    async fn test_http_error_is_unreachable() {
        let server = mock_server("", 500).await;
        let provider = FrankfurterProvider::new(&server.uri());

        let err = provider.fetch_rates().await.unwrap_err();
        assert!(matches!(err, RateError::ProviderUnreachable { .. }));
    }
}
