// In crates/signals/src/lib.rs

use core_types::{DerivedSignal, PriceBar};

pub mod lookahead;
pub mod rsi;
pub mod types;

pub use lookahead::{TradeMarks, TradeRules, schedule_trades};
pub use rsi::{RSI_NO_DOWNSIDE, RsiLookahead, relative_strength_index};
pub use types::RsiSettings;

/// The universal interface for turning a price series into derived signals.
///
/// A calculator is a pure transform: it holds only its settings, never reads
/// the clock or storage, and returns one row per eligible bar in input order.
/// Input that is too short or malformed yields an empty vector.
pub trait SignalCalculator: Send + Sync {
    /// The name of the calculator.
    fn name(&self) -> &'static str;

    fn calculate(&self, bars: &[PriceBar]) -> Vec<DerivedSignal>;
}
