// In crates/database/src/bars.rs

use crate::error::{Error, Result};
use crate::types::PriceBarRow;
use core_types::{DateRange, NewPriceBar, PriceBar};
use sqlx::SqliteConnection;

/// Storage for ingested daily bars, keyed by `(instrument_id, bar_date)`.
pub struct PriceBarStore;

impl PriceBarStore {
    /// Inserts bars for one instrument, leaving any bar already stored for
    /// the same date untouched. Returns the number of bars actually added.
    pub async fn insert_new(
        conn: &mut SqliteConnection,
        instrument_id: i64,
        bars: &[NewPriceBar],
    ) -> Result<u64> {
        let mut inserted = 0;

        for bar in bars {
            let result = sqlx::query(
                r#"
                INSERT INTO price_bars (instrument_id, bar_date, open, high, low, close, adj_close, volume)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (instrument_id, bar_date) DO NOTHING
                "#,
            )
            .bind(instrument_id)
            .bind(bar.date)
            .bind(bar.open)
            .bind(bar.high)
            .bind(bar.low)
            .bind(bar.close)
            .bind(bar.adj_close)
            .bind(bar.volume)
            .execute(&mut *conn)
            .await
            .map_err(Error::OperationFailed)?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Returns the instrument's bars whose date falls in `range`, oldest first.
    pub async fn in_range(
        conn: &mut SqliteConnection,
        instrument_id: i64,
        range: DateRange,
    ) -> Result<Vec<PriceBar>> {
        let rows: Vec<PriceBarRow> = sqlx::query_as(
            r#"
            SELECT id, instrument_id, bar_date, open, high, low, close, adj_close, volume
            FROM price_bars
            WHERE instrument_id = ? AND bar_date >= ? AND bar_date <= ?
            ORDER BY bar_date ASC
            "#,
        )
        .bind(instrument_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::OperationFailed)?;

        Ok(rows.into_iter().map(PriceBar::from).collect())
    }
}
