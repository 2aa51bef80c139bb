//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single fixed time interval.
///
/// Timestamps are timezone-naive and serialize as ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns the name of the first field that breaks the price/volume contract.
    ///
    /// Prices must be finite and strictly positive; volume must be finite and
    /// non-negative.
    pub fn invalid_field(&self) -> Option<&'static str> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Some(name);
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some("volume");
        }
        None
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_field().is_none()
    }
}
