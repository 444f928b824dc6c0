// In crates/api-client/src/lib.rs

use app_config::MarketDataSettings;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use core_types::{DateRange, Interval, MarketDataFeed, NewPriceBar};
use std::time::Duration;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

impl YahooClient {
    /// Constructs a new YahooClient from MarketDataSettings.
    pub fn new(settings: &MarketDataSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        Ok(YahooClient {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches daily bars for `code` whose date falls in the inclusive `range`.
    ///
    /// This corresponds to the `GET /v8/finance/chart/{symbol}` endpoint.
    pub async fn get_daily_bars(&self, code: &str, range: DateRange) -> Result<Vec<NewPriceBar>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        // `period2` is exclusive; step one day past the range end.
        let period1 = epoch_seconds(range.start);
        let period2 = range
            .end
            .checked_add_days(Days::new(1))
            .map(epoch_seconds)
            .unwrap_or(i64::MAX);

        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&events=div%2Csplits&includeAdjustedClose=true",
            self.base_url,
            code,
            period1,
            period2,
            Interval::Daily.as_str(),
        );

        tracing::debug!(%url, "Fetching daily bars.");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Yahoo reports most failures in the chart envelope, even on 4xx.
        let parsed: ChartResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(Error::ApiError {
                    code: status.as_u16().to_string(),
                    msg: status.canonical_reason().unwrap_or("Unknown error").to_string(),
                });
            }
            Err(e) => return Err(Error::DeserializationFailed(e)),
        };

        let bars: Vec<NewPriceBar> = parsed
            .into_bars()?
            .into_iter()
            .filter(|bar| range.contains(bar.date))
            .collect();

        tracing::debug!(code, count = bars.len(), "Received daily bars.");
        Ok(bars)
    }
}

#[async_trait]
impl MarketDataFeed for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn daily_bars(&self, code: &str, range: DateRange) -> core_types::Result<Vec<NewPriceBar>> {
        Ok(self.get_daily_bars(code, range).await?)
    }
}

fn epoch_seconds(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

// Free function to allow api_client::new usage
pub fn new(settings: &MarketDataSettings) -> Result<YahooClient> {
    YahooClient::new(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MarketDataSettings {
        MarketDataSettings {
            base_url: "https://query1.finance.yahoo.com/".into(),
            timeout_secs: 5,
            user_agent: "test".into(),
        }
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = new(&settings()).unwrap();
        assert_eq!(client.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(client.name(), "yahoo");
    }

    #[test]
    fn test_epoch_seconds_is_utc_midnight() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(epoch_seconds(date), 1_672_531_200);
    }

    #[test]
    fn test_errors_map_to_fetch_errors() {
        use core_types::FetchError;
        let api: FetchError = Error::ApiError { code: "404".into(), msg: "Not Found".into() }.into();
        assert!(matches!(api, FetchError::Unavailable(_)));
        let missing: FetchError = Error::MissingData("chart result").into();
        assert!(matches!(missing, FetchError::Malformed(_)));
    }
}
