// In crates/signals/src/types.rs

use crate::lookahead::TradeRules;
use serde::{Deserialize, Serialize};

/// Parameters of the RSI lookahead calculator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RsiSettings {
    /// Number of trailing returns averaged into mean gain / mean loss.
    #[serde(default = "default_window")]
    pub window: usize,
    /// An RSI strictly below this marks an opportunity.
    #[serde(default = "default_opportunity_below")]
    pub opportunity_below: f64,
    /// An RSI strictly above this, after an opportunity, schedules the sell.
    #[serde(default = "default_exit_above")]
    pub exit_above: f64,
    /// Bars to wait for the exit crossing before the sell is forced.
    #[serde(default = "default_max_holding_bars")]
    pub max_holding_bars: usize,
}

impl RsiSettings {
    pub fn trade_rules(&self) -> TradeRules {
        TradeRules {
            opportunity_below: self.opportunity_below,
            exit_above: self.exit_above,
            max_holding_bars: self.max_holding_bars,
        }
    }

    /// Checks the settings for values the calculator cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.window == 0 {
            return Err("signals.window must be greater than 0".into());
        }
        if self.max_holding_bars == 0 {
            return Err("signals.max_holding_bars must be greater than 0".into());
        }
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.opportunity_below) || !in_range(self.exit_above) {
            return Err("signals thresholds must lie within [0, 100]".into());
        }
        Ok(())
    }
}

impl Default for RsiSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
            opportunity_below: default_opportunity_below(),
            exit_above: default_exit_above(),
            max_holding_bars: default_max_holding_bars(),
        }
    }
}

fn default_window() -> usize { 22 }
fn default_opportunity_below() -> f64 { 30.0 }
fn default_exit_above() -> f64 { 40.0 }
fn default_max_holding_bars() -> usize { 10 }
