// In crates/api-client/src/types.rs

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate};
use core_types::NewPriceBar;
use reqwest::Client;
use serde::Deserialize;

/// The client for the Yahoo Finance chart API.
#[derive(Debug, Clone)]
pub struct YahooClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// The base URL of the chart API (e.g., "https://query1.finance.yahoo.com").
    pub base_url: String,
}

/// The top-level envelope of `GET /v8/finance/chart/{symbol}`.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Bar open times in seconds since the epoch. Absent when the range is empty.
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    /// Offset of the exchange's time zone from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

/// Column arrays aligned with `timestamp`; a missing value is `null`.
#[derive(Debug, Deserialize, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Converts the column arrays into daily bars, oldest first.
    ///
    /// Days without a close are skipped. A missing adjusted close falls back
    /// to the close; other missing fields become zero.
    pub fn into_bars(self) -> Result<Vec<NewPriceBar>> {
        if let Some(error) = self.chart.error {
            return Err(Error::ApiError {
                code: error.code,
                msg: error.description,
            });
        }

        let result = self
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or(Error::MissingData("chart result"))?;

        let Some(timestamps) = result.timestamp else {
            return Ok(Vec::new());
        };

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or(Error::MissingData("quote indicators"))?;
        let adjusted = result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|a| a.adjclose)
            .unwrap_or_default();

        let offset = result.meta.gmtoffset;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &timestamp) in timestamps.iter().enumerate() {
            let Some(close) = at(&quote.close, i) else {
                continue;
            };
            let date = trading_date(timestamp, offset).ok_or(Error::MissingData("valid timestamp"))?;

            bars.push(NewPriceBar {
                date,
                open: at(&quote.open, i).unwrap_or(0.0),
                high: at(&quote.high, i).unwrap_or(0.0),
                low: at(&quote.low, i).unwrap_or(0.0),
                close,
                adj_close: at(&adjusted, i).unwrap_or(close),
                volume: at(&quote.volume, i).unwrap_or(0.0),
            });
        }

        Ok(bars)
    }
}

fn at(column: &[Option<f64>], i: usize) -> Option<f64> {
    column.get(i).copied().flatten()
}

/// The exchange-local calendar date of a bar's open time.
fn trading_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}
