//! Equity curve points.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Mark-to-market account value at one bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

impl EquityPoint {
    pub fn new(timestamp: NaiveDateTime, equity: f64) -> Self {
        Self { timestamp, equity }
    }
}

/// Extract the raw equity values of a curve.
pub fn equity_values(curve: &[EquityPoint]) -> Vec<f64> {
    curve.iter().map(|p| p.equity).collect()
}
