pub mod ui;

use crate::config::{AppConfig, currency_for_country};
use crate::core::convert::{ConversionService, round2};
use crate::export::{self, ExportFormat};
use crate::ledger::{LedgerStore, Trip, TripMode};
use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::info;

/// Which trips an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Current,
    All,
}

pub fn run_start(
    ledger: &LedgerStore,
    config: &AppConfig,
    budget: f64,
    country: Option<&str>,
    currency: Option<&str>,
    domestic: bool,
) -> Result<()> {
    if !budget.is_finite() || budget <= 0.0 {
        bail!("Budget must be a positive amount");
    }

    let (country_code, currency, mode) = if domestic {
        (
            country.unwrap_or("KR").to_string(),
            config.home_currency.clone(),
            TripMode::Domestic,
        )
    } else {
        let country_code = country
            .context("A destination country is required, e.g. --country JP")?
            .to_string();
        let currency = match currency {
            Some(code) => code.to_string(),
            None => currency_for_country(&country_code)
                .map(str::to_string)
                .with_context(|| {
                    format!("Unknown currency for country {country_code}, pass --currency")
                })?,
        };
        (country_code, currency, TripMode::World)
    };

    let trip = ledger.start_trip(&country_code, &currency, mode, budget)?;
    info!(trip_id = trip.id, "Started trip");
    println!(
        "Started trip {} ({} | {}) with budget {} {}",
        trip.id,
        trip.country_code,
        trip.currency,
        ui::style_text(&format!("{:.2}", trip.budget_home), ui::StyleType::TotalValue),
        config.home_currency
    );
    Ok(())
}

pub async fn run_add(
    ledger: &LedgerStore,
    service: &ConversionService,
    amount: f64,
    note: &str,
) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Expense amount must be positive");
    }
    let trip = ledger
        .current_trip()
        .context("No active trip; start one first")?;

    let (home_amount, fx_rate, fx_provider) = match trip.mode {
        TripMode::Domestic => (round2(amount), None, "none".to_string()),
        TripMode::World => {
            let conversion = service
                .convert(amount, &trip.currency)
                .await
                .map_err(|e| anyhow!(e))
                .context("Unable to retrieve exchange rate, try again later")?;
            let fx_rate = if conversion.provider == "self" {
                None
            } else {
                conversion.effective_rate
            };
            (conversion.converted_amount, fx_rate, conversion.provider)
        }
    };

    let trip = ledger.add_expense(trip.id, amount, home_amount, note, fx_rate, &fx_provider)?;
    let added = trip
        .expenses
        .last()
        .context("Expense list empty after insert")?;
    println!(
        "Added expense {}: {:.2} {} -> {:.2} {} (via {}) | remaining {}",
        added.id,
        added.local_amount,
        added.local_currency,
        added.home_amount,
        service.home_currency(),
        added.fx_provider,
        ui::style_text(
            &format!("{:.2}", trip.remaining_home),
            ui::StyleType::TotalLabel
        ),
    );
    Ok(())
}

pub fn run_list(ledger: &LedgerStore, home: &str) -> Result<()> {
    let trip = ledger
        .current_trip()
        .context("No active trip; start one first")?;
    println!("{}", render_trip(&trip, home));
    Ok(())
}

pub fn run_trips(ledger: &LedgerStore, home: &str) -> Result<()> {
    let trips = ledger.load_trips();
    if trips.is_empty() {
        println!("No trips recorded.");
        return Ok(());
    }

    let current = ledger.current_trip_id();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Trip"),
        ui::header_cell("Country"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Budget ({home})")),
        ui::header_cell(&format!("Remaining ({home})")),
        ui::header_cell("Expenses"),
        ui::header_cell("Created"),
    ]);
    for trip in &trips {
        let marker = if current == Some(trip.id) { "*" } else { "" };
        table.add_row(vec![
            Cell::new(format!("{}{marker}", trip.id)),
            Cell::new(&trip.country_code),
            Cell::new(&trip.currency),
            ui::amount_cell(trip.budget_home),
            ui::balance_cell(trip.remaining_home),
            Cell::new(trip.expenses.len().to_string()),
            Cell::new(trip.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn render_trip(trip: &Trip, home: &str) -> String {
    let label = match trip.mode {
        TripMode::Domestic => format!("Domestic ({home})"),
        TripMode::World => format!("{} | {}", trip.country_code, trip.currency),
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Local"),
        ui::header_cell(&format!("Amount ({home})")),
        ui::header_cell("Rate"),
        ui::header_cell("Note"),
        ui::header_cell(&format!("Remaining ({home})")),
    ]);
    for expense in &trip.expenses {
        table.add_row(vec![
            Cell::new(expense.id.to_string()),
            Cell::new(format!(
                "{:.2} {}",
                expense.local_amount, expense.local_currency
            )),
            ui::amount_cell(expense.home_amount),
            ui::rate_cell(expense.fx_rate),
            Cell::new(export::sanitize_note(&expense.note)),
            ui::balance_cell(expense.remaining),
        ]);
    }

    format!(
        "Trip {}: {}\n\n{}\n\nRemaining ({}): {}",
        trip.id,
        ui::style_text(&label, ui::StyleType::Title),
        table,
        ui::style_text(home, ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", trip.remaining_home),
            if trip.remaining_home < 0.0 {
                ui::StyleType::Warning
            } else {
                ui::StyleType::TotalValue
            }
        ),
    )
}

pub fn run_export(
    ledger: &LedgerStore,
    home: &str,
    format: ExportFormat,
    scope: ExportScope,
    output: Option<PathBuf>,
) -> Result<()> {
    let trips = match scope {
        ExportScope::All => ledger.load_trips(),
        ExportScope::Current => ledger.current_trip().into_iter().collect(),
    };
    if trips.is_empty() {
        bail!("No trip data to export");
    }

    let payload = export::build_export(&trips, format, home)?;
    let path = output.unwrap_or_else(|| PathBuf::from(export::default_file_name(format, Utc::now())));
    std::fs::write(&path, payload)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    println!("Exported {} trip(s) to {}", trips.len(), path.display());
    Ok(())
}

pub fn run_delete_trip(ledger: &LedgerStore, trip_id: u64) -> Result<()> {
    if ledger.delete_trip(trip_id)? {
        println!("Deleted trip {trip_id}");
        Ok(())
    } else {
        bail!("Trip not found: {trip_id}")
    }
}

pub fn run_delete_expense(ledger: &LedgerStore, trip_id: u64, expense_id: u64) -> Result<()> {
    if ledger.delete_expense(trip_id, expense_id)? {
        println!("Deleted expense {expense_id} from trip {trip_id}");
        Ok(())
    } else {
        bail!("Expense not found: trip {trip_id}, expense {expense_id}")
    }
}

pub fn run_clear(ledger: &LedgerStore) -> Result<()> {
    ledger.clear()?;
    println!("All stored data removed.");
    Ok(())
}
