//! Trip and expense persistence. Plain CRUD over the blob store; all the
//! interesting conversion work happens before an expense reaches this module.

use crate::core::convert::round2;
use crate::store::BlobStore;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

const TRIPS_KEY: &str = "trips";
const CURRENT_TRIP_KEY: &str = "current_trip";
const NEXT_TRIP_ID_KEY: &str = "next_trip_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripMode {
    World,
    Domestic,
}

impl Default for TripMode {
    fn default() -> Self {
        TripMode::World
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: u64,
    pub local_amount: f64,
    pub local_currency: String,
    pub home_amount: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub fx_rate: Option<f64>,
    #[serde(default = "no_provider")]
    pub fx_provider: String,
    /// Budget left after this expense; recomputed on every mutation.
    #[serde(default)]
    pub remaining: f64,
    pub created_at: DateTime<Utc>,
}

fn no_provider() -> String {
    "none".to_string()
}

fn first_id() -> u64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: u64,
    pub country_code: String,
    pub currency: String,
    #[serde(default)]
    pub mode: TripMode,
    pub budget_home: f64,
    #[serde(default)]
    pub remaining_home: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default = "first_id")]
    pub next_expense_id: u64,
}

impl Trip {
    /// Recomputes every running balance from the budget down, re-rounding at
    /// each step, and repairs fields older ledgers may have stored badly.
    pub fn recalc(&mut self) {
        self.budget_home = round2(self.budget_home);
        let mut running = self.budget_home;
        for expense in &mut self.expenses {
            expense.home_amount = round2(expense.home_amount);
            running = round2(running - expense.home_amount);
            expense.remaining = running;
            // Derive a missing rate from the two amounts when possible
            if expense.fx_rate.is_none()
                && self.mode == TripMode::World
                && expense.local_amount > 0.0
            {
                let derived = expense.home_amount / expense.local_amount;
                if derived.is_finite() {
                    expense.fx_rate = Some(derived);
                }
            }
        }
        self.remaining_home = running;

        let max_id = self.expenses.iter().map(|e| e.id).max().unwrap_or(0);
        if self.next_expense_id <= max_id {
            self.next_expense_id = max_id + 1;
        }
    }

    pub fn total_spent(&self) -> f64 {
        round2(self.expenses.iter().map(|e| e.home_amount).sum())
    }
}

/// Trips and expenses over the blob store. Whole-ledger read-modify-write,
/// last writer wins; fine for a single-user tool.
pub struct LedgerStore {
    store: Arc<dyn BlobStore>,
}

impl LedgerStore {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// A broken ledger blob yields an empty ledger rather than a crash; the
    /// error is logged so the user can recover the raw data by hand.
    pub fn load_trips(&self) -> Vec<Trip> {
        let raw = match self.store.get(TRIPS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(error = %e, "Failed to read stored trips");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Trip>>(&raw) {
            Ok(mut trips) => {
                for trip in &mut trips {
                    trip.recalc();
                }
                trips
            }
            Err(e) => {
                error!(error = %e, "Failed to parse stored trips");
                Vec::new()
            }
        }
    }

    fn save_trips(&self, trips: &[Trip]) -> Result<()> {
        let json = serde_json::to_string(trips).context("Failed to serialize trips")?;
        self.store.put(TRIPS_KEY, &json)
    }

    fn next_trip_id(&self) -> Result<u64> {
        let id = self
            .store
            .get(NEXT_TRIP_ID_KEY)?
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(1);
        self.store.put(NEXT_TRIP_ID_KEY, &(id + 1).to_string())?;
        Ok(id)
    }

    pub fn current_trip_id(&self) -> Option<u64> {
        self.store
            .get(CURRENT_TRIP_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse::<u64>().ok())
    }

    pub fn set_current_trip(&self, trip_id: Option<u64>) -> Result<()> {
        match trip_id {
            Some(id) => self.store.put(CURRENT_TRIP_KEY, &id.to_string()),
            None => self.store.remove(CURRENT_TRIP_KEY),
        }
    }

    pub fn current_trip(&self) -> Option<Trip> {
        let id = self.current_trip_id()?;
        self.load_trips().into_iter().find(|t| t.id == id)
    }

    /// Creates a trip, makes it current and returns it.
    pub fn start_trip(
        &self,
        country_code: &str,
        currency: &str,
        mode: TripMode,
        budget_home: f64,
    ) -> Result<Trip> {
        let mut trips = self.load_trips();
        let mut trip = Trip {
            id: self.next_trip_id()?,
            country_code: country_code.to_ascii_uppercase(),
            currency: currency.to_ascii_uppercase(),
            mode,
            budget_home,
            remaining_home: budget_home,
            created_at: Utc::now(),
            expenses: Vec::new(),
            next_expense_id: 1,
        };
        trip.recalc();
        trips.push(trip.clone());
        self.save_trips(&trips)?;
        self.set_current_trip(Some(trip.id))?;
        Ok(trip)
    }

    /// Appends an already-converted expense to a trip and returns the
    /// updated trip.
    pub fn add_expense(
        &self,
        trip_id: u64,
        local_amount: f64,
        home_amount: f64,
        note: &str,
        fx_rate: Option<f64>,
        fx_provider: &str,
    ) -> Result<Trip> {
        let mut trips = self.load_trips();
        let trip = trips
            .iter_mut()
            .find(|t| t.id == trip_id)
            .ok_or_else(|| anyhow!("Trip not found: {trip_id}"))?;

        let expense = Expense {
            id: trip.next_expense_id,
            local_amount,
            local_currency: trip.currency.clone(),
            home_amount,
            note: note.to_string(),
            fx_rate,
            fx_provider: fx_provider.to_string(),
            remaining: 0.0,
            created_at: Utc::now(),
        };
        trip.next_expense_id += 1;
        trip.expenses.push(expense);
        trip.recalc();

        let updated = trip.clone();
        self.save_trips(&trips)?;
        Ok(updated)
    }

    pub fn delete_trip(&self, trip_id: u64) -> Result<bool> {
        let mut trips = self.load_trips();
        let before = trips.len();
        trips.retain(|t| t.id != trip_id);
        if trips.len() == before {
            return Ok(false);
        }
        self.save_trips(&trips)?;
        if self.current_trip_id() == Some(trip_id) {
            self.set_current_trip(None)?;
        }
        Ok(true)
    }

    pub fn delete_expense(&self, trip_id: u64, expense_id: u64) -> Result<bool> {
        let mut trips = self.load_trips();
        let Some(trip) = trips.iter_mut().find(|t| t.id == trip_id) else {
            return Ok(false);
        };
        let before = trip.expenses.len();
        trip.expenses.retain(|e| e.id != expense_id);
        if trip.expenses.len() == before {
            return Ok(false);
        }
        trip.recalc();
        self.save_trips(&trips)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(TRIPS_KEY)?;
        self.store.remove(CURRENT_TRIP_KEY)?;
        self.store.remove(NEXT_TRIP_ID_KEY)?;
        Ok(())
    }
}
