//! Signal sources — turn a bar series plus parameters into one signal per bar.
//!
//! Sources are portfolio-agnostic: they see bar history only, never cash or
//! position state. The engine decides whether a signal is acted on.

pub mod bollinger_reversion;
pub mod macd_crossover;
pub mod rsi_reversal;
pub mod sma_crossover;

use thiserror::Error;

use crate::domain::{BarSeries, Signal, SignalSequence};

use super::params::ParamMap;

/// Errors raised while building signals from parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("invalid parameter '{name}' = {value}: {reason}")]
    InvalidParam {
        name: String,
        value: String,
        reason: &'static str,
    },

    #[error("invalid parameters: {0}")]
    InvalidCombination(String),

    #[error("signal source '{source_name}' produced {signals} signals for {bars} bars")]
    WrongLength {
        source_name: String,
        bars: usize,
        signals: usize,
    },

    #[error("signal source '{source_name}' failed: {reason}")]
    SourceFailed { source_name: String, reason: String },
}

/// Trait for signal sources.
///
/// # Architecture invariant
/// `generate` must return exactly one signal per bar, and the signal at bar t
/// may only depend on bars `0..=t`.
pub trait SignalSource: Send + Sync {
    /// Registry name (e.g., "sma_crossover").
    fn name(&self) -> &str;

    fn generate(&self, bars: &BarSeries, params: &ParamMap)
        -> Result<SignalSequence, StrategyError>;
}

/// Adapter that turns a closure into a `SignalSource`.
pub struct FnSignalSource<F> {
    name: String,
    func: F,
}

impl<F> FnSignalSource<F>
where
    F: Fn(&BarSeries, &ParamMap) -> Result<SignalSequence, StrategyError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> SignalSource for FnSignalSource<F>
where
    F: Fn(&BarSeries, &ParamMap) -> Result<SignalSequence, StrategyError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        bars: &BarSeries,
        params: &ParamMap,
    ) -> Result<SignalSequence, StrategyError> {
        let signals = (self.func)(bars, params)?;
        if signals.len() != bars.len() {
            return Err(StrategyError::WrongLength {
                source_name: self.name.clone(),
                bars: bars.len(),
                signals: signals.len(),
            });
        }
        Ok(signals)
    }
}

impl<F> std::fmt::Debug for FnSignalSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSignalSource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ─── Crossing helpers ────────────────────────────────────────────────
//
// Comparisons involving NaN are false, so undefined warmup values never fire.

/// `a` crosses above `b` at bar i: `a[i] > b[i]` and `a[i-1] <= b[i-1]`.
pub fn crosses_above(a: &[f64], b: &[f64]) -> Vec<bool> {
    crossings(a.len().min(b.len()), |i| {
        a[i] > b[i] && a[i - 1] <= b[i - 1]
    })
}

/// `a` crosses below `b` at bar i: `a[i] < b[i]` and `a[i-1] >= b[i-1]`.
pub fn crosses_below(a: &[f64], b: &[f64]) -> Vec<bool> {
    crossings(a.len().min(b.len()), |i| {
        a[i] < b[i] && a[i - 1] >= b[i - 1]
    })
}

/// `values` rises through `level`: `v[i] > level` and `v[i-1] <= level`.
pub fn rises_through(values: &[f64], level: f64) -> Vec<bool> {
    crossings(values.len(), |i| values[i] > level && values[i - 1] <= level)
}

/// `values` falls through `level`: `v[i] < level` and `v[i-1] >= level`.
pub fn falls_through(values: &[f64], level: f64) -> Vec<bool> {
    crossings(values.len(), |i| values[i] < level && values[i - 1] >= level)
}

/// Evaluate `fired` for bars 1..len; bar 0 never fires.
fn crossings(len: usize, fired: impl Fn(usize) -> bool) -> Vec<bool> {
    (0..len).map(|i| i > 0 && fired(i)).collect()
}

/// Merge entry and exit conditions into one sequence.
///
/// When both fire on the same bar the exit wins.
pub fn combine(entries: &[bool], exits: &[bool]) -> SignalSequence {
    entries
        .iter()
        .zip(exits)
        .map(|(&enter, &exit)| {
            if exit {
                Signal::Exit
            } else if enter {
                Signal::Enter
            } else {
                Signal::Hold
            }
        })
        .collect()
}

/// Daily bar series built from closes, for strategy tests.
#[cfg(test)]
pub(crate) fn closes_series(closes: &[f64]) -> BarSeries {
    BarSeries::new(crate::indicators::make_bars(closes)).unwrap()
}

pub use bollinger_reversion::{bollinger_reversion_signals, BollingerParams};
pub use macd_crossover::{macd_crossover_signals, MacdParams};
pub use rsi_reversal::{rsi_reversal_signals, RsiParams};
pub use sma_crossover::{sma_crossover_signals, SmaCrossoverParams};
