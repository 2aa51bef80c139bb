//! Bollinger band reversion.
//!
//! Enter on the first bar back inside the lower band after a close below it.
//! Exit on the first bar back inside the upper band after a close above it.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::components::params::{number, param_map, period, ParamMap, ParamValue};
use crate::domain::{BarSeries, SignalSequence};
use crate::indicators::Bollinger;

use super::{combine, StrategyError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub period: usize,
    pub std_dev: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
        }
    }
}

impl BollingerParams {
    pub fn from_params(params: &ParamMap) -> Result<Self, StrategyError> {
        let d = Self::default();
        let p = Self {
            period: period(params, "period", d.period)?,
            std_dev: number(params, "std_dev", d.std_dev)?,
        };
        // Sample standard deviation needs two observations.
        if p.period < 2 {
            return Err(StrategyError::InvalidParam {
                name: "period".into(),
                value: p.period.to_string(),
                reason: "must be at least 2",
            });
        }
        if p.std_dev < 0.0 {
            return Err(StrategyError::InvalidParam {
                name: "std_dev".into(),
                value: p.std_dev.to_string(),
                reason: "must not be negative",
            });
        }
        Ok(p)
    }

    pub fn to_params(&self) -> ParamMap {
        param_map([
            ("period", ParamValue::from(self.period)),
            ("std_dev", self.std_dev.into()),
        ])
    }
}

pub fn bollinger_reversion_signals(bars: &BarSeries, params: &BollingerParams) -> SignalSequence {
    let upper = Bollinger::upper(params.period, params.std_dev).compute(bars.as_slice());
    let lower = Bollinger::lower(params.period, params.std_dev).compute(bars.as_slice());

    let below: Vec<bool> = bars.iter().zip(&lower).map(|(b, &l)| b.close < l).collect();
    let above: Vec<bool> = bars.iter().zip(&upper).map(|(b, &u)| b.close > u).collect();

    let back_inside = |outside: &[bool]| -> Vec<bool> {
        (0..outside.len())
            .map(|i| i > 0 && !outside[i] && outside[i - 1])
            .collect()
    };
    combine(&back_inside(&below), &back_inside(&above))
}
