//! MACD crossover — MACD line against its signal line.
//!
//! Enter when MACD crosses above the signal line, exit on the mirror cross.

use serde::{Deserialize, Serialize};

use crate::components::params::{param_map, period, ParamMap};
use crate::domain::{BarSeries, SignalSequence};
use crate::indicators::{Macd, MacdLine};

use super::{combine, crosses_above, crosses_below, StrategyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdParams {
    pub fn from_params(params: &ParamMap) -> Result<Self, StrategyError> {
        let d = Self::default();
        let p = Self {
            fast_period: period(params, "fast_period", d.fast_period)?,
            slow_period: period(params, "slow_period", d.slow_period)?,
            signal_period: period(params, "signal_period", d.signal_period)?,
        };
        if p.fast_period >= p.slow_period {
            return Err(StrategyError::InvalidCombination(format!(
                "fast_period ({}) must be less than slow_period ({})",
                p.fast_period, p.slow_period
            )));
        }
        Ok(p)
    }

    pub fn to_params(&self) -> ParamMap {
        param_map([
            ("fast_period", self.fast_period),
            ("slow_period", self.slow_period),
            ("signal_period", self.signal_period),
        ])
    }
}

pub fn macd_crossover_signals(bars: &BarSeries, params: &MacdParams) -> SignalSequence {
    let macd = Macd::new(
        params.fast_period,
        params.slow_period,
        params.signal_period,
        MacdLine::Macd,
    );
    let (line, signal) = macd.lines(&bars.closes());
    combine(&crosses_above(&line, &signal), &crosses_below(&line, &signal))
}
