pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod ledger;
pub mod providers;
pub mod store;

use crate::cli::ExportScope;
use crate::config::AppConfig;
use crate::core::cache::RateCache;
use crate::core::convert::ConversionService;
use crate::core::resolver::RateResolver;
use crate::export::ExportFormat;
use crate::ledger::LedgerStore;
use crate::providers::chain::RateProviderChain;
use crate::store::BlobStore;
use crate::store::disk::DiskStore;
use anyhow::Result;
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub enum AppCommand {
    Start {
        budget: f64,
        country: Option<String>,
        currency: Option<String>,
        domestic: bool,
    },
    Add {
        amount: f64,
        note: String,
    },
    List,
    Trips,
    Export {
        format: ExportFormat,
        scope: ExportScope,
        output: Option<PathBuf>,
    },
    DeleteTrip {
        trip_id: u64,
    },
    DeleteExpense {
        trip_id: u64,
        expense_id: u64,
    },
    Clear,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let store: Arc<dyn BlobStore> = Arc::new(DiskStore::open(&data_path)?);
    let ledger = LedgerStore::new(Arc::clone(&store));

    let cache = RateCache::new(
        Arc::clone(&store),
        config.rate_overrides.clone(),
        Duration::hours(config.cache_ttl_hours),
    );
    let chain = RateProviderChain::from_config(&config.providers, config.rate_overrides.clone());
    let resolver = RateResolver::new(cache, chain, &config.home_currency);
    let service = ConversionService::new(resolver);
    let home = service.home_currency().to_string();

    match command {
        AppCommand::Start {
            budget,
            country,
            currency,
            domestic,
        } => cli::run_start(
            &ledger,
            &config,
            budget,
            country.as_deref(),
            currency.as_deref(),
            domestic,
        ),
        AppCommand::Add { amount, note } => cli::run_add(&ledger, &service, amount, &note).await,
        AppCommand::List => cli::run_list(&ledger, &home),
        AppCommand::Trips => cli::run_trips(&ledger, &home),
        AppCommand::Export {
            format,
            scope,
            output,
        } => cli::run_export(&ledger, &home, format, scope, output),
        AppCommand::DeleteTrip { trip_id } => cli::run_delete_trip(&ledger, trip_id),
        AppCommand::DeleteExpense {
            trip_id,
            expense_id,
        } => cli::run_delete_expense(&ledger, trip_id, expense_id),
        AppCommand::Clear => cli::run_clear(&ledger),
    }
}
