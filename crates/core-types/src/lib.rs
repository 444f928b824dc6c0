// In crates/core-types/src/lib.rs

pub mod error;
pub mod source;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{FetchError, Result};
pub use source::{MarketDataFeed, PriceSeriesSource};
pub use types::{
    DateRange, DerivedSignal, Instrument, Interval, NewPriceBar, PriceBar, StoredSignal,
};
