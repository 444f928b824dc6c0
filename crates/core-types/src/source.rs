// In crates/core-types/src/source.rs

use crate::error::Result;
use crate::types::{DateRange, Instrument, Interval, NewPriceBar, PriceBar};
use async_trait::async_trait;

/// Supplies the stored price series that signals are calculated from.
///
/// Implementations must return bars ordered by ascending date with no
/// duplicate dates. An instrument with no bars in the range yields an empty
/// vector, not an error.
#[async_trait]
pub trait PriceSeriesSource: Send + Sync {
    async fn fetch(
        &self,
        instrument: &Instrument,
        range: DateRange,
        interval: Interval,
    ) -> Result<Vec<PriceBar>>;
}

/// An upstream market-data provider used to ingest new daily bars.
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// The provider's name, used in logs.
    fn name(&self) -> &'static str;

    async fn daily_bars(&self, code: &str, range: DateRange) -> Result<Vec<NewPriceBar>>;
}
