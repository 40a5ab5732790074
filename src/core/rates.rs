//! Rate table shapes shared by the cache, provider chain and resolver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Currency code -> units of that currency per one unit of the pivot (USD).
/// Invariant: `rates[PIVOT_CURRENCY] == 1.0`, all values finite and positive.
pub type RateTable = HashMap<String, f64>;

/// All provider tables are expressed relative to this currency; cross-rates
/// between two non-pivot currencies divide through it.
pub const PIVOT_CURRENCY: &str = "USD";

/// A rate table as persisted in the blob store, stamped with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRates {
    pub rates: RateTable,
    pub provider: String,
    pub fetched_at: DateTime<Utc>,
}

/// Rate table plus the identity of whichever source produced it.
#[derive(Debug, Clone)]
pub struct ResolvedRates {
    pub rates: RateTable,
    pub provider: String,
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Fills in static fallback rates, only where the table has no valid entry.
/// A valid provider-supplied rate is never replaced.
pub fn apply_overrides(rates: &mut RateTable, overrides: &HashMap<String, f64>) {
    for (code, fallback) in overrides {
        let usable = rates.get(code).copied().is_some_and(is_valid_rate);
        if !usable && is_valid_rate(*fallback) {
            rates.insert(code.clone(), *fallback);
        }
    }
}

/// Required codes with no positive finite rate in the table, sorted for
/// stable log output.
pub fn missing_codes(rates: &RateTable, required: &HashSet<String>) -> Vec<String> {
    let mut missing: Vec<String> = required
        .iter()
        .filter(|code| !rates.get(*code).copied().is_some_and(is_valid_rate))
        .cloned()
        .collect();
    missing.sort();
    missing
}
