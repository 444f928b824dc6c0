// In app/src/main.rs

use anyhow::Result;
use app_config::Settings;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use core_types::{DateRange, Instrument, PriceSeriesSource};
use database::{Db, InstrumentRegistry, SignalRepository};
use engine::{IngestionRunner, ReconciliationRunner, RunReport};
use signals::RsiLookahead;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Daily price ingestion and RSI trade signals.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Registers an instrument whose bars will be ingested from `since`.
    Register {
        /// The ticker as the market data feed knows it (e.g., "PETR4.SA").
        #[arg(short, long)]
        code: String,

        #[arg(short, long)]
        description: Option<String>,

        /// First date to ingest, in YYYY-MM-DD format.
        #[arg(long)]
        since: NaiveDate,
    },

    /// Pulls daily bars up to yesterday for every (or the given) instrument.
    Ingest {
        #[arg(short, long = "instrument")]
        instruments: Vec<String>,
    },

    /// Recalculates and stores derived signals for a date range.
    Calculate {
        /// The start date in YYYY-MM-DD format.
        #[arg(long)]
        start_date: NaiveDate,

        /// The end date (inclusive) in YYYY-MM-DD format.
        #[arg(long)]
        end_date: NaiveDate,

        /// Restricts the run to these instrument codes.
        #[arg(short, long = "instrument")]
        instruments: Vec<String>,
    },

    /// Prints the stored signals of one instrument as JSON.
    Signals {
        #[arg(short, long)]
        instrument: String,

        #[arg(long)]
        start_date: NaiveDate,

        #[arg(long)]
        end_date: NaiveDate,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings()?;
    init_tracing(&settings)?;
    tracing::info!(environment = %settings.app.environment, "Application settings loaded successfully.");

    let db = database::connect(&settings.database).await?;
    tracing::info!("Database connection established and migrations are up-to-date.");

    // Match on the parsed command and call the appropriate handler.
    let result = match cli.command {
        Commands::Register { code, description, since } => {
            handle_register(&db, &code, description.as_deref(), since).await
        }
        Commands::Ingest { instruments } => handle_ingest(&settings, &db, &instruments).await,
        Commands::Calculate {
            start_date,
            end_date,
            instruments,
        } => handle_calculate(&settings, &db, date_range(start_date, end_date)?, &instruments).await,
        Commands::Signals {
            instrument,
            start_date,
            end_date,
        } => handle_signals(&db, &instrument, date_range(start_date, end_date)?).await,
    };

    db.close().await;
    result
}

fn init_tracing(settings: &Settings) -> Result<()> {
    let level: tracing::Level = settings
        .app
        .log_level
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid log level: {}", settings.app.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("sqlx::query", tracing::Level::WARN) // Disable sqlx query debug logs
                .with_default(level),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
    Ok(())
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    let range = DateRange::new(start, end);
    if range.is_empty() {
        anyhow::bail!("Start date {} is after end date {}.", start, end);
    }
    Ok(range)
}

/// Loads the registered instruments, restricted to `codes` when any are given.
async fn select_instruments(db: &Db, codes: &[String]) -> Result<Vec<Instrument>> {
    let mut conn = db.acquire().await?;
    let all = InstrumentRegistry::list(&mut conn).await?;

    if codes.is_empty() {
        return Ok(all);
    }

    if let Some(unknown) = codes.iter().find(|code| !all.iter().any(|i| &i.code == *code)) {
        anyhow::bail!("Instrument {} is not registered.", unknown);
    }
    Ok(all.into_iter().filter(|i| codes.contains(&i.code)).collect())
}

/// Prints the report to stdout and fails the command if any instrument failed.
fn finish(report: &RunReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);

    if report.failed() > 0 {
        for (code, error) in report.failures() {
            tracing::error!(instrument = code, %error, "Instrument was not processed.");
        }
        anyhow::bail!("{} of {} instruments failed.", report.failed(), report.instruments.len());
    }
    Ok(())
}

// --- Subcommand Logic ---

async fn handle_register(db: &Db, code: &str, description: Option<&str>, since: NaiveDate) -> Result<()> {
    let mut conn = db.acquire().await?;
    if InstrumentRegistry::find_by_code(&mut conn, code).await?.is_some() {
        anyhow::bail!("Instrument {} is already registered.", code);
    }
    let instrument = InstrumentRegistry::register(&mut conn, code, description, since).await?;
    println!("{}", serde_json::to_string_pretty(&instrument)?);
    Ok(())
}

async fn handle_ingest(settings: &Settings, db: &Db, codes: &[String]) -> Result<()> {
    let instruments = select_instruments(db, codes).await?;
    let feed = Arc::new(api_client::new(&settings.market_data)?);

    let today = Local::now().date_naive();
    let report = IngestionRunner::new(db.clone(), feed).run(&instruments, today).await;
    finish(&report)
}

async fn handle_calculate(settings: &Settings, db: &Db, range: DateRange, codes: &[String]) -> Result<()> {
    let instruments = select_instruments(db, codes).await?;

    let source: Arc<dyn PriceSeriesSource> = Arc::new(db.clone());
    let calculator = Box::new(RsiLookahead::new(settings.signals.clone()));
    let report = ReconciliationRunner::new(db.clone(), source, calculator)
        .run(&instruments, range)
        .await;
    finish(&report)
}

async fn handle_signals(db: &Db, code: &str, range: DateRange) -> Result<()> {
    let mut conn = db.acquire().await?;
    let instrument = InstrumentRegistry::find_by_code(&mut conn, code)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Instrument {} is not registered.", code))?;

    let signals = SignalRepository::for_instrument(&mut conn, instrument.id, range).await?;
    tracing::info!(instrument = %instrument, count = signals.len(), %range, "Loaded stored signals.");
    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}
