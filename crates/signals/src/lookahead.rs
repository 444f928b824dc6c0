// In crates/signals/src/lookahead.rs

//! The buy/sell decision rule applied over a finished RSI series.
//!
//! An opportunity (RSI below the entry threshold) is only knowable once its
//! bar has closed, so the buy lands on the following bar. The sell lands on
//! the bar after the first RSI reading above the exit threshold within the
//! holding horizon, or on the bar after the horizon if no reading crosses.

/// Thresholds for the lookahead decision rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRules {
    pub opportunity_below: f64,
    pub exit_above: f64,
    pub max_holding_bars: usize,
}

/// The decision flags for one row of the series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeMarks {
    pub is_opportunity: bool,
    pub should_buy: bool,
    pub should_sell: bool,
}

impl TradeRules {
    /// `rsi == opportunity_below` is not an opportunity.
    pub fn is_opportunity(&self, rsi: f64) -> bool {
        rsi < self.opportunity_below
    }
}

/// Scans the RSI series once, in index order, and returns one set of marks
/// per row.
///
/// Marks from overlapping opportunity windows are OR-ed together: a row set
/// by one window is never cleared by another. Targets past the end of the
/// series are dropped.
pub fn schedule_trades(rsi: &[f64], rules: &TradeRules) -> Vec<TradeMarks> {
    let mut marks: Vec<TradeMarks> = rsi
        .iter()
        .map(|&value| TradeMarks {
            is_opportunity: rules.is_opportunity(value),
            ..TradeMarks::default()
        })
        .collect();

    for i in 0..rsi.len() {
        if !marks[i].is_opportunity {
            continue;
        }

        if let Some(entry) = marks.get_mut(i + 1) {
            entry.should_buy = true;
        }

        for j in 1..=rules.max_holding_bars {
            let probe = i + j;
            let Some(&value) = rsi.get(probe) else {
                break;
            };

            // Earliest crossing wins; the horizon's last bar forces the exit.
            if value > rules.exit_above || j == rules.max_holding_bars {
                if let Some(exit) = marks.get_mut(probe + 1) {
                    exit.should_sell = true;
                }
                break;
            }
        }
    }

    marks
}
