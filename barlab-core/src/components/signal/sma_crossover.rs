//! SMA crossover — trend following on two simple moving averages.
//!
//! Enter when the fast SMA crosses above the slow SMA (golden cross).
//! Exit when the fast SMA crosses below the slow SMA (death cross).

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::components::params::{param_map, period, ParamMap};
use crate::domain::{BarSeries, SignalSequence};
use crate::indicators::Sma;

use super::{combine, crosses_above, crosses_below, StrategyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaCrossoverParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for SmaCrossoverParams {
    fn default() -> Self {
        Self {
            fast_period: 10,
            slow_period: 50,
        }
    }
}

impl SmaCrossoverParams {
    pub fn from_params(params: &ParamMap) -> Result<Self, StrategyError> {
        let d = Self::default();
        let fast_period = period(params, "fast_period", d.fast_period)?;
        let slow_period = period(params, "slow_period", d.slow_period)?;
        if fast_period >= slow_period {
            return Err(StrategyError::InvalidCombination(format!(
                "fast_period ({fast_period}) must be less than slow_period ({slow_period})"
            )));
        }
        Ok(Self {
            fast_period,
            slow_period,
        })
    }

    pub fn to_params(&self) -> ParamMap {
        param_map([
            ("fast_period", self.fast_period),
            ("slow_period", self.slow_period),
        ])
    }
}

pub fn sma_crossover_signals(bars: &BarSeries, params: &SmaCrossoverParams) -> SignalSequence {
    let fast = Sma::new(params.fast_period).compute(bars.as_slice());
    let slow = Sma::new(params.slow_period).compute(bars.as_slice());
    combine(&crosses_above(&fast, &slow), &crosses_below(&fast, &slow))
}
