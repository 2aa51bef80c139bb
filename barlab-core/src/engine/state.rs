//! Engine configuration, per-run mutable state, and run result types.

use serde::{Deserialize, Serialize};

use crate::domain::{EquityPoint, Position, Trade, ValidationError};

/// Default commission rate (0.1%).
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

/// Default starting capital.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

/// Configuration for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Flat fraction charged on entry and exit value, in `[0, 1)`.
    pub commission_rate: f64,
}

impl EngineConfig {
    pub fn new(initial_capital: f64, commission_rate: f64) -> Self {
        Self {
            initial_capital,
            commission_rate,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ValidationError::InvalidCapital(self.initial_capital));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(ValidationError::InvalidCommission(self.commission_rate));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPITAL, DEFAULT_COMMISSION_RATE)
    }
}

/// Mutable state that evolves bar-by-bar during one run.
///
/// Built fresh by every call to `run_simulation`; never shared between runs.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Cash balance while flat. While long it holds the pre-entry balance,
    /// which mark-to-market adds unrealized P&L to.
    pub cash: f64,
    pub position: Position,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl SimulationState {
    pub fn new(initial_capital: f64, bar_count: usize) -> Self {
        Self {
            cash: initial_capital,
            position: Position::Flat,
            trades: Vec::new(),
            equity_curve: Vec::with_capacity(bar_count),
        }
    }
}

/// Output of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: f64,
    /// Cash after the end-of-series closeout.
    pub final_capital: f64,
}

impl SimulationResult {
    /// Number of completed (exit) trades.
    pub fn completed_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.is_exit()).count()
    }
}
