// In crates/database/src/repository.rs

use crate::error::{Error, Result};
use crate::types::{SignalRow, UpsertSummary};
use chrono::{DateTime, Utc};
use core_types::{DateRange, DerivedSignal, StoredSignal};
use sqlx::{Connection, SqliteConnection};

/// Idempotent storage for derived signals, keyed by the source bar id.
pub struct SignalRepository;

impl SignalRepository {
    /// Writes every signal under its `source_bar_id`: a new key is inserted,
    /// an existing one has all computed fields overwritten in place. Both
    /// paths stamp `processed_at`.
    ///
    /// The batch runs inside its own transaction (a savepoint when `conn` is
    /// already in one), so a failing record leaves none of the batch applied.
    pub async fn upsert(
        conn: &mut SqliteConnection,
        signals: &[DerivedSignal],
        processed_at: DateTime<Utc>,
    ) -> Result<UpsertSummary> {
        let mut tx = conn.begin().await.map_err(Error::OperationFailed)?;
        let mut summary = UpsertSummary::default();

        for signal in signals {
            let existing: Option<i64> =
                sqlx::query_scalar("SELECT id FROM derived_signals WHERE price_bar_id = ?")
                    .bind(signal.source_bar_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(Error::OperationFailed)?;

            match existing {
                Some(id) => {
                    sqlx::query(
                        r#"
                        UPDATE derived_signals
                        SET bar_date = ?, processed_at = ?, return_pct = ?, gain = ?, loss = ?,
                            mean_gain = ?, mean_loss = ?, rsi = ?, is_opportunity = ?,
                            should_buy = ?, should_sell = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(signal.date)
                    .bind(processed_at)
                    .bind(signal.return_pct)
                    .bind(signal.gain)
                    .bind(signal.loss)
                    .bind(signal.mean_gain)
                    .bind(signal.mean_loss)
                    .bind(signal.rsi)
                    .bind(signal.is_opportunity)
                    .bind(signal.should_buy)
                    .bind(signal.should_sell)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::OperationFailed)?;
                    summary.updated += 1;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO derived_signals (
                            price_bar_id, bar_date, processed_at, return_pct, gain, loss,
                            mean_gain, mean_loss, rsi, is_opportunity, should_buy, should_sell
                        )
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(signal.source_bar_id)
                    .bind(signal.date)
                    .bind(processed_at)
                    .bind(signal.return_pct)
                    .bind(signal.gain)
                    .bind(signal.loss)
                    .bind(signal.mean_gain)
                    .bind(signal.mean_loss)
                    .bind(signal.rsi)
                    .bind(signal.is_opportunity)
                    .bind(signal.should_buy)
                    .bind(signal.should_sell)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::OperationFailed)?;
                    summary.inserted += 1;
                }
            }
        }

        tx.commit().await.map_err(Error::OperationFailed)?;

        tracing::debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            "Upserted derived signals."
        );
        Ok(summary)
    }

    /// Returns the stored signals of one instrument within `range`, oldest first.
    pub async fn for_instrument(
        conn: &mut SqliteConnection,
        instrument_id: i64,
        range: DateRange,
    ) -> Result<Vec<StoredSignal>> {
        let rows: Vec<SignalRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.price_bar_id, s.bar_date, s.processed_at, s.return_pct, s.gain,
                   s.loss, s.mean_gain, s.mean_loss, s.rsi, s.is_opportunity,
                   s.should_buy, s.should_sell
            FROM derived_signals s
            JOIN price_bars b ON b.id = s.price_bar_id
            WHERE b.instrument_id = ? AND s.bar_date >= ? AND s.bar_date <= ?
            ORDER BY s.bar_date ASC
            "#,
        )
        .bind(instrument_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::OperationFailed)?;

        Ok(rows.into_iter().map(StoredSignal::from).collect())
    }

    /// Counts every stored signal.
    pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM derived_signals")
            .fetch_one(&mut *conn)
            .await
            .map_err(Error::OperationFailed)
    }
}
