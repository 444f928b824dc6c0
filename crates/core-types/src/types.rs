// In crates/core-types/src/types.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable instrument as held in the instrument registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// The stable numeric id of the instrument.
    pub id: i64,
    /// The ticker used to query market data (e.g., "PETR4.SA").
    pub code: String,
    pub description: Option<String>,
    /// The last date bars were integrated up to. Owned by the ingestion job.
    pub last_integration: NaiveDate,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.code, self.id)
    }
}

/// The sampling interval of a price series. Only daily bars are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    Daily,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
        }
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range whose start lies after its end covers no dates.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// One stored trading day for one instrument (read model).
///
/// Bars are immutable once ingested; `id` is the key every derived signal
/// refers back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub id: i64,
    pub instrument_id: i64,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

/// A trading day as delivered by a market-data feed, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

/// The computed momentum record for one eligible price bar (write model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSignal {
    /// The id of the `PriceBar` this row was computed for. Unique in storage.
    pub source_bar_id: i64,
    pub date: NaiveDate,
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

/// A derived signal as it exists in storage (read model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSignal {
    pub id: i64,
    /// When the row was last written by a reconciliation run.
    pub processed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub signal: DerivedSignal,
}
