//! RSI reversal — mean reversion on oversold/overbought thresholds.
//!
//! Enter when RSI rises back through the oversold level.
//! Exit when RSI falls back through the overbought level.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::components::params::{number, param_map, period, ParamMap, ParamValue};
use crate::domain::{BarSeries, SignalSequence};
use crate::indicators::Rsi;

use super::{combine, falls_through, rises_through, StrategyError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl RsiParams {
    pub fn from_params(params: &ParamMap) -> Result<Self, StrategyError> {
        let d = Self::default();
        let p = Self {
            period: period(params, "period", d.period)?,
            overbought: number(params, "overbought", d.overbought)?,
            oversold: number(params, "oversold", d.oversold)?,
        };
        if !(0.0..=100.0).contains(&p.oversold) || !(0.0..=100.0).contains(&p.overbought) {
            return Err(StrategyError::InvalidCombination(format!(
                "RSI thresholds must lie in [0, 100] (oversold {}, overbought {})",
                p.oversold, p.overbought
            )));
        }
        if p.oversold >= p.overbought {
            return Err(StrategyError::InvalidCombination(format!(
                "oversold ({}) must be below overbought ({})",
                p.oversold, p.overbought
            )));
        }
        Ok(p)
    }

    pub fn to_params(&self) -> ParamMap {
        param_map([
            ("period", ParamValue::from(self.period)),
            ("overbought", self.overbought.into()),
            ("oversold", self.oversold.into()),
        ])
    }
}

pub fn rsi_reversal_signals(bars: &BarSeries, params: &RsiParams) -> SignalSequence {
    let rsi = Rsi::new(params.period).compute(bars.as_slice());
    combine(
        &rises_through(&rsi, params.oversold),
        &falls_through(&rsi, params.overbought),
    )
}
