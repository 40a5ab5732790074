//! Text and CSV serialization of the ledger.

use crate::ledger::{Trip, TripMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

const DIVIDER: &str = "─────────────────────────────────────────────────────";
// Spreadsheet apps need the BOM to detect UTF-8 in CSV files.
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

pub fn build_export(trips: &[Trip], format: ExportFormat, home_currency: &str) -> Result<String> {
    match format {
        ExportFormat::Txt => Ok(build_text_report(trips, home_currency)),
        ExportFormat::Csv => build_csv(trips, home_currency),
    }
}

/// Timestamped default file name, e.g. `trips-2026-08-25-10-30-00.csv`.
pub fn default_file_name(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!(
        "trips-{}.{}",
        now.format("%Y-%m-%d-%H-%M-%S"),
        format.extension()
    )
}

pub fn sanitize_note(note: &str) -> String {
    note.replace(['\r', '\n'], " ").trim().to_string()
}

fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

fn format_rate(fx_rate: Option<f64>) -> String {
    match fx_rate {
        Some(rate) => format!("{rate:.6}"),
        None => "none".to_string(),
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn build_text_report(trips: &[Trip], home: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for trip in trips {
        lines.push(DIVIDER.to_string());
        lines.push("[Trip Summary]".to_string());
        lines.push(format!(
            "Trip {} | Country: {} | Currency: {}",
            trip.id, trip.country_code, trip.currency
        ));
        lines.push(format!(
            "Budget ({home}): {} | Remaining ({home}): {}",
            format_amount(trip.budget_home),
            format_amount(trip.remaining_home)
        ));
        lines.push(format!("Created: {}", format_timestamp(&trip.created_at)));
        lines.push(String::new());
        lines.push("[Expenses]".to_string());
        if trip.expenses.is_empty() {
            lines.push("No expenses recorded.".to_string());
        } else {
            for expense in &trip.expenses {
                let note = sanitize_note(&expense.note);
                let note = if note.is_empty() { "none" } else { note.as_str() };
                let rate = match trip.mode {
                    TripMode::Domestic => "none".to_string(),
                    TripMode::World => format_rate(expense.fx_rate),
                };
                lines.push(format!(
                    "- {} {} -> {} {home} | note: {note} | rate: {rate} | remaining: {} | {}",
                    format_amount(expense.local_amount),
                    expense.local_currency,
                    format_amount(expense.home_amount),
                    format_amount(expense.remaining),
                    format_timestamp(&expense.created_at),
                ));
            }
        }
        lines.push(String::new());
        lines.push("[Totals]".to_string());
        lines.push(format!(
            "Expenses: {} | Total spent ({home}): {}",
            trip.expenses.len(),
            format_amount(trip.total_spent())
        ));
        lines.push(DIVIDER.to_string());
    }
    lines.join("\n")
}

pub fn build_csv(trips: &[Trip], home: &str) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let home_lower = home.to_ascii_lowercase();
    let budget_col = format!("budget_{home_lower}");
    let remaining_col = format!("remaining_{home_lower}");
    let amount_col = format!("amount_{home_lower}");
    writer
        .write_record([
            "trip_id",
            "country_code",
            "currency",
            budget_col.as_str(),
            remaining_col.as_str(),
            "expense_id",
            "local_amount",
            "local_currency",
            amount_col.as_str(),
            "fx_rate",
            "note",
            "remaining_after",
            "created_at",
        ])
        .context("Failed to write CSV header")?;

    for trip in trips {
        if trip.expenses.is_empty() {
            writer
                .write_record([
                    trip.id.to_string(),
                    trip.country_code.clone(),
                    trip.currency.clone(),
                    format_amount(trip.budget_home),
                    format_amount(trip.remaining_home),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    format_timestamp(&trip.created_at),
                ])
                .context("Failed to write CSV row")?;
            continue;
        }
        for expense in &trip.expenses {
            let rate = match trip.mode {
                TripMode::Domestic => "none".to_string(),
                TripMode::World => format_rate(expense.fx_rate),
            };
            writer
                .write_record([
                    trip.id.to_string(),
                    trip.country_code.clone(),
                    trip.currency.clone(),
                    format_amount(trip.budget_home),
                    format_amount(trip.remaining_home),
                    expense.id.to_string(),
                    format_amount(expense.local_amount),
                    expense.local_currency.clone(),
                    format_amount(expense.home_amount),
                    rate,
                    sanitize_note(&expense.note),
                    format_amount(expense.remaining),
                    format_timestamp(&expense.created_at),
                ])
                .context("Failed to write CSV row")?;
        }
    }

    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    let body = String::from_utf8(bytes).context("CSV output was not valid UTF-8")?;
    Ok(format!("{UTF8_BOM}{body}"))
}
