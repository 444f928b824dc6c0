// In crates/database/src/lib.rs

use app_config::types::DatabaseSettings;
use async_trait::async_trait;
use core_types::{DateRange, FetchError, Instrument, Interval, PriceBar, PriceSeriesSource};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;

pub mod bars;
pub mod error;
pub mod registry;
pub mod repository;
pub mod types;

// Re-export the most important types for easy access.
pub use bars::PriceBarStore;
pub use error::{Error, Result};
pub use registry::InstrumentRegistry;
pub use repository::SignalRepository;
pub use types::UpsertSummary;

/// An open unit of work. Dropping it without `commit` rolls it back.
pub type Session = Transaction<'static, Sqlite>;

/// A wrapper around the `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct Db(SqlitePool);

/// Opens a connection pool to the SQLite database and runs migrations.
///
/// # Arguments
///
/// * `settings`: The database configuration settings.
///
/// # Returns
///
/// A `Result` containing the `Db` wrapper on success, or an `Error` on failure.
pub async fn connect(settings: &DatabaseSettings) -> Result<Db> {
    let options = SqliteConnectOptions::from_str(&settings.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await?;

    Db::migrate(pool).await
}

impl Db {
    /// Opens a private in-memory database holding the full schema.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn connect_in_memory() -> Result<Db> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Db::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Db> {
        // Run database migrations. This ensures the database schema is up-to-date.
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::debug!("Database migrations are up-to-date.");
        Ok(Db(pool))
    }

    /// Starts a transaction. Repository calls made through it apply together
    /// on `commit` or not at all.
    pub async fn begin(&self) -> Result<Session> {
        self.0.begin().await.map_err(Error::OperationFailed)
    }

    /// Checks out a plain connection for reads.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.0.acquire().await.map_err(Error::OperationFailed)
    }

    pub async fn close(&self) {
        self.0.close().await;
    }
}

/// Stored bars are the series signals are calculated from.
#[async_trait]
impl PriceSeriesSource for Db {
    async fn fetch(
        &self,
        instrument: &Instrument,
        range: DateRange,
        interval: Interval,
    ) -> core_types::Result<Vec<PriceBar>> {
        // Only daily bars are stored.
        let Interval::Daily = interval;

        let mut conn = self
            .acquire()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        PriceBarStore::in_range(&mut conn, instrument.id, range)
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))
    }
}
