// In crates/database/src/registry.rs

use crate::error::{Error, Result};
use crate::types::InstrumentRow;
use chrono::NaiveDate;
use core_types::Instrument;
use sqlx::SqliteConnection;

/// Read and maintenance access to the `instruments` table.
///
/// Reconciliation only reads the registry; the watermark is moved by the
/// ingestion job.
pub struct InstrumentRegistry;

impl InstrumentRegistry {
    /// Returns every registered instrument, ordered by code.
    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<Instrument>> {
        let rows: Vec<InstrumentRow> = sqlx::query_as(
            "SELECT id, code, description, last_integration FROM instruments ORDER BY code",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::OperationFailed)?;

        Ok(rows.into_iter().map(Instrument::from).collect())
    }

    pub async fn find_by_code(
        conn: &mut SqliteConnection,
        code: &str,
    ) -> Result<Option<Instrument>> {
        let row: Option<InstrumentRow> = sqlx::query_as(
            "SELECT id, code, description, last_integration FROM instruments WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::OperationFailed)?;

        Ok(row.map(Instrument::from))
    }

    /// Adds an instrument whose bars will be integrated from `since` onwards.
    pub async fn register(
        conn: &mut SqliteConnection,
        code: &str,
        description: Option<&str>,
        since: NaiveDate,
    ) -> Result<Instrument> {
        let row: InstrumentRow = sqlx::query_as(
            r#"
            INSERT INTO instruments (code, description, last_integration)
            VALUES (?, ?, ?)
            RETURNING id, code, description, last_integration
            "#,
        )
        .bind(code)
        .bind(description)
        .bind(since)
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::OperationFailed)?;

        tracing::info!(instrument = %row.code, id = row.id, %since, "Registered instrument.");
        Ok(row.into())
    }

    /// Moves the instrument's watermark.
    pub async fn set_last_integration(
        conn: &mut SqliteConnection,
        instrument_id: i64,
        date: NaiveDate,
    ) -> Result<()> {
        sqlx::query("UPDATE instruments SET last_integration = ? WHERE id = ?")
            .bind(date)
            .bind(instrument_id)
            .execute(&mut *conn)
            .await
            .map_err(Error::OperationFailed)?;
        Ok(())
    }
}
