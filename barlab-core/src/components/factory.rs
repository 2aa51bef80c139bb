//! Strategy registry — maps names to the built-in signal sources.
//!
//! The set of built-ins is closed: `Strategy` is an enum, and `Strategy::ALL`
//! lists every variant. Parameters are validated by each strategy's typed
//! params struct before any indicator is computed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{BarSeries, SignalSequence};

use super::params::ParamMap;
use super::signal::{
    bollinger_reversion_signals, macd_crossover_signals, rsi_reversal_signals,
    sma_crossover_signals, BollingerParams, MacdParams, RsiParams, SignalSource,
    SmaCrossoverParams, StrategyError,
};

/// Built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SmaCrossover,
    Rsi,
    BollingerBands,
    Macd,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::SmaCrossover,
        Strategy::Rsi,
        Strategy::BollingerBands,
        Strategy::Macd,
    ];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SmaCrossover => "sma_crossover",
            Self::Rsi => "rsi",
            Self::BollingerBands => "bollinger_bands",
            Self::Macd => "macd",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, StrategyError> {
        let key = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name() == key)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SmaCrossover => "Fast SMA crossing the slow SMA",
            Self::Rsi => "RSI recovering from oversold / fading from overbought",
            Self::BollingerBands => "Close re-entering the Bollinger bands",
            Self::Macd => "MACD line crossing its signal line",
        }
    }

    /// Default parameters, in the same shape users pass them.
    pub fn default_params(&self) -> ParamMap {
        match self {
            Self::SmaCrossover => SmaCrossoverParams::default().to_params(),
            Self::Rsi => RsiParams::default().to_params(),
            Self::BollingerBands => BollingerParams::default().to_params(),
            Self::Macd => MacdParams::default().to_params(),
        }
    }

    /// Validate `params` without touching any bars.
    pub fn check_params(&self, params: &ParamMap) -> Result<(), StrategyError> {
        match self {
            Self::SmaCrossover => SmaCrossoverParams::from_params(params).map(|_| ()),
            Self::Rsi => RsiParams::from_params(params).map(|_| ()),
            Self::BollingerBands => BollingerParams::from_params(params).map(|_| ()),
            Self::Macd => MacdParams::from_params(params).map(|_| ()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl SignalSource for Strategy {
    fn name(&self) -> &str {
        Strategy::name(self)
    }

    fn generate(
        &self,
        bars: &BarSeries,
        params: &ParamMap,
    ) -> Result<SignalSequence, StrategyError> {
        let signals = match self {
            Self::SmaCrossover => {
                sma_crossover_signals(bars, &SmaCrossoverParams::from_params(params)?)
            }
            Self::Rsi => rsi_reversal_signals(bars, &RsiParams::from_params(params)?),
            Self::BollingerBands => {
                bollinger_reversion_signals(bars, &BollingerParams::from_params(params)?)
            }
            Self::Macd => macd_crossover_signals(bars, &MacdParams::from_params(params)?),
        };
        Ok(signals)
    }
}
