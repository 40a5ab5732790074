use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderEndpoint {
    pub base_url: String,
}

/// Base URLs for the rate providers, in chain priority order. Overridable so
/// tests can point the chain at local mock servers.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub frankfurter: ProviderEndpoint,
    pub er_api: ProviderEndpoint,
    pub currency_api: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            frankfurter: ProviderEndpoint {
                base_url: "https://api.frankfurter.app".to_string(),
            },
            er_api: ProviderEndpoint {
                base_url: "https://open.er-api.com".to_string(),
            },
            currency_api: ProviderEndpoint {
                base_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest"
                    .to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Currency every converted amount is expressed in.
    pub home_currency: String,
    pub providers: ProvidersConfig,
    /// Static fallback rates (units per USD), used only when no provider
    /// supplies a valid rate for that code.
    pub rate_overrides: HashMap<String, f64>,
    pub cache_ttl_hours: i64,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            home_currency: "KRW".to_string(),
            providers: ProvidersConfig::default(),
            rate_overrides: default_rate_overrides(),
            cache_ttl_hours: 6,
            data_path: None,
        }
    }
}

/// Currencies the reference deployment needs even when a provider's feed
/// omits them.
fn default_rate_overrides() -> HashMap<String, f64> {
    [
        ("KRW".to_string(), 1350.0),
        ("RUB".to_string(), 95.0),
        ("TWD".to_string(), 31.5),
    ]
    .into_iter()
    .collect()
}

impl AppConfig {
    /// Loads the user config, falling back to defaults when none exists yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "tripwon", "tripwon")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "tripwon", "tripwon")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

/// Primary currency for a destination country in the reference deployment.
/// Codes outside this list require an explicit `--currency`.
pub fn currency_for_country(country_code: &str) -> Option<&'static str> {
    let currency = match country_code.to_ascii_uppercase().as_str() {
        "KR" => "KRW",
        "RU" => "RUB",
        "TW" => "TWD",
        "CN" => "CNY",
        "HK" => "HKD",
        "JP" => "JPY",
        "US" => "USD",
        "GB" => "GBP",
        "SG" => "SGD",
        "TH" => "THB",
        "VN" => "VND",
        "PH" => "PHP",
        "ID" => "IDR",
        "MY" => "MYR",
        "AU" => "AUD",
        "NZ" => "NZD",
        "CA" => "CAD",
        "CH" => "CHF",
        "IN" => "INR",
        "DE" | "FR" | "IT" | "ES" | "NL" | "AT" | "PT" | "GR" | "FI" | "IE" => "EUR",
        _ => return None,
    };
    Some(currency)
}
