use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tripwon::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Txt,
    Csv,
}

impl From<Format> for tripwon::export::ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Txt => tripwon::export::ExportFormat::Txt,
            Format::Csv => tripwon::export::ExportFormat::Csv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Scope {
    Current,
    All,
}

impl From<Scope> for tripwon::cli::ExportScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Current => tripwon::cli::ExportScope::Current,
            Scope::All => tripwon::cli::ExportScope::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Start a new trip with a budget in the home currency
    Start {
        /// Total budget in the home currency
        budget: f64,
        /// Destination country code, e.g. JP
        #[arg(long)]
        country: Option<String>,
        /// Local currency code; inferred from the country when omitted
        #[arg(long)]
        currency: Option<String>,
        /// Track a home-currency trip with no conversion
        #[arg(long)]
        domestic: bool,
    },
    /// Add an expense in the trip's local currency
    Add {
        amount: f64,
        #[arg(default_value = "")]
        note: String,
    },
    /// Show the current trip's ledger
    List,
    /// Show all recorded trips
    Trips,
    /// Export trips as text or CSV
    Export {
        #[arg(long, value_enum, default_value = "txt")]
        format: Format,
        #[arg(long, value_enum, default_value = "all")]
        scope: Scope,
        /// Output file; defaults to a timestamped name
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete a trip and all its expenses
    DeleteTrip { trip_id: u64 },
    /// Delete a single expense
    DeleteExpense { trip_id: u64, expense_id: u64 },
    /// Remove all stored data
    Clear,
}

impl From<Commands> for tripwon::AppCommand {
    fn from(cmd: Commands) -> tripwon::AppCommand {
        match cmd {
            Commands::Start {
                budget,
                country,
                currency,
                domestic,
            } => tripwon::AppCommand::Start {
                budget,
                country,
                currency,
                domestic,
            },
            Commands::Add { amount, note } => tripwon::AppCommand::Add { amount, note },
            Commands::List => tripwon::AppCommand::List,
            Commands::Trips => tripwon::AppCommand::Trips,
            Commands::Export {
                format,
                scope,
                output,
            } => tripwon::AppCommand::Export {
                format: format.into(),
                scope: scope.into(),
                output,
            },
            Commands::DeleteTrip { trip_id } => tripwon::AppCommand::DeleteTrip { trip_id },
            Commands::DeleteExpense {
                trip_id,
                expense_id,
            } => tripwon::AppCommand::DeleteExpense {
                trip_id,
                expense_id,
            },
            Commands::Clear => tripwon::AppCommand::Clear,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => tripwon::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = tripwon::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
home_currency: "KRW"

providers:
  frankfurter:
    base_url: "https://api.frankfurter.app"
  er_api:
    base_url: "https://open.er-api.com"
  currency_api:
    base_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest"

rate_overrides:
  KRW: 1350.0
  RUB: 95.0
  TWD: 31.5

cache_ttl_hours: 6
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
