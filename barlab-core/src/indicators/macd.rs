//! Moving Average Convergence Divergence (MACD).
//!
//! Two lines (separate Indicator instances):
//! - MACD: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(MACD, signal)
//!
//! EMAs are seeded with the first value, so both lines are defined from bar 0.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::ema::ema_of_series;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(
            fast >= 1 && slow >= 1 && signal >= 1,
            "MACD spans must be >= 1"
        );
        let label = match line {
            MacdLine::Macd => "line",
            MacdLine::Signal => "signal",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    /// Compute both lines at once: `(macd, signal)`.
    pub fn lines(&self, closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema_of_series(&macd, self.signal);
        (macd, signal)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (macd, signal) = self.lines(&closes);
        match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => signal,
        }
    }
}
