// In crates/database/src/types.rs

//! Row shapes as they come out of SQLite, and their conversion into the
//! shared record types.

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{DerivedSignal, Instrument, PriceBar, StoredSignal};

/// The number of rows a signal upsert created and overwrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl UpsertSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InstrumentRow {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub last_integration: NaiveDate,
}

impl From<InstrumentRow> for Instrument {
    fn from(row: InstrumentRow) -> Self {
        Instrument {
            id: row.id,
            code: row.code,
            description: row.description,
            last_integration: row.last_integration,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PriceBarRow {
    pub id: i64,
    pub instrument_id: i64,
    pub bar_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl From<PriceBarRow> for PriceBar {
    fn from(row: PriceBarRow) -> Self {
        PriceBar {
            id: row.id,
            instrument_id: row.instrument_id,
            date: row.bar_date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
            volume: row.volume,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SignalRow {
    pub id: i64,
    pub price_bar_id: i64,
    pub bar_date: NaiveDate,
    pub processed_at: DateTime<Utc>,
    pub return_pct: f64,
    pub gain: f64,
    pub loss: f64,
    pub mean_gain: f64,
    pub mean_loss: f64,
    pub rsi: f64,
    pub is_opportunity: bool,
    pub should_buy: bool,
    pub should_sell: bool,
}

impl From<SignalRow> for StoredSignal {
    fn from(row: SignalRow) -> Self {
        StoredSignal {
            id: row.id,
            processed_at: row.processed_at,
            signal: DerivedSignal {
                source_bar_id: row.price_bar_id,
                date: row.bar_date,
                return_pct: row.return_pct,
                gain: row.gain,
                loss: row.loss,
                mean_gain: row.mean_gain,
                mean_loss: row.mean_loss,
                rsi: row.rsi,
                is_opportunity: row.is_opportunity,
                should_buy: row.should_buy,
                should_sell: row.should_sell,
            },
        }
    }
}
