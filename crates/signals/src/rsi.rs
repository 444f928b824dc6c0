// In crates/signals/src/rsi.rs

use crate::lookahead::schedule_trades;
use crate::types::RsiSettings;
use crate::SignalCalculator;
use core_types::{DerivedSignal, PriceBar};
use tracing::{debug, warn};

/// The RSI reported for a window with no losses, where the gain/loss ratio
/// is undefined. It includes the flat window with no gains either.
pub const RSI_NO_DOWNSIDE: f64 = 100.0;

/// Computes the oscillator from the window's mean gain and mean loss.
pub fn relative_strength_index(mean_gain: f64, mean_loss: f64) -> f64 {
    if mean_loss == 0.0 {
        return RSI_NO_DOWNSIDE;
    }
    100.0 - 100.0 / (1.0 + mean_gain / mean_loss)
}

/// A simple-moving-average RSI with the lookahead buy/sell rule.
#[derive(Debug, Clone, Default)]
pub struct RsiLookahead {
    settings: RsiSettings,
}

impl RsiLookahead {
    /// Creates a new `RsiLookahead` calculator from its settings.
    pub fn new(settings: RsiSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RsiSettings {
        &self.settings
    }
}

impl SignalCalculator for RsiLookahead {
    fn name(&self) -> &'static str {
        "RsiLookahead"
    }

    fn calculate(&self, bars: &[PriceBar]) -> Vec<DerivedSignal> {
        let window = self.settings.window;

        // One bar has no return and the first `window - 1` returns cannot
        // fill a window.
        if window == 0 || bars.len() <= window {
            return Vec::new();
        }

        if let Some(reason) = malformed(bars) {
            warn!(
                instrument_id = bars[0].instrument_id,
                reason, "Discarding malformed price series."
            );
            return Vec::new();
        }

        // `returns[k]` belongs to `bars[k + 1]`.
        let returns: Vec<f64> = bars
            .windows(2)
            .map(|pair| (pair[1].adj_close - pair[0].adj_close) / pair[0].adj_close)
            .collect();
        let gains: Vec<f64> = returns.iter().map(|&r| if r > 0.0 { r } else { 0.0 }).collect();
        let losses: Vec<f64> = returns.iter().map(|&r| if r < 0.0 { -r } else { 0.0 }).collect();

        let mut rows: Vec<DerivedSignal> = (window - 1..returns.len())
            .map(|end| {
                let span = end + 1 - window..=end;
                // Summed over the slice so a loss-free window is exactly zero.
                let mean_gain = gains[span.clone()].iter().sum::<f64>() / window as f64;
                let mean_loss = losses[span].iter().sum::<f64>() / window as f64;
                let bar = &bars[end + 1];

                DerivedSignal {
                    source_bar_id: bar.id,
                    date: bar.date,
                    return_pct: returns[end],
                    gain: gains[end],
                    loss: losses[end],
                    mean_gain,
                    mean_loss,
                    rsi: relative_strength_index(mean_gain, mean_loss),
                    is_opportunity: false,
                    should_buy: false,
                    should_sell: false,
                }
            })
            .collect();

        let rsi: Vec<f64> = rows.iter().map(|row| row.rsi).collect();
        let marks = schedule_trades(&rsi, &self.settings.trade_rules());
        for (row, mark) in rows.iter_mut().zip(marks) {
            row.is_opportunity = mark.is_opportunity;
            row.should_buy = mark.should_buy;
            row.should_sell = mark.should_sell;
        }

        debug!(
            instrument_id = bars[0].instrument_id,
            bars = bars.len(),
            rows = rows.len(),
            "Calculated derived signals."
        );

        rows
    }
}

/// Describes why a series cannot produce defined returns, if it cannot.
fn malformed(bars: &[PriceBar]) -> Option<&'static str> {
    if bars.windows(2).any(|pair| pair[1].date <= pair[0].date) {
        return Some("dates are not strictly ascending");
    }
    if bars.iter().any(|bar| !bar.adj_close.is_finite() || bar.adj_close <= 0.0) {
        return Some("adjusted close must be finite and positive");
    }
    None
}
