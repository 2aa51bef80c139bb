//! BarSeries — a validated, ascending, de-duplicated sequence of bars.
//!
//! Every series handed to the engine has passed through `BarSeries::new`, so
//! the loop never re-checks ordering or price positivity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;

/// Malformed input detected before a simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("bar series is empty")]
    EmptySeries,

    #[error("bar {index} ({timestamp}) has an invalid {field}")]
    InvalidBar {
        index: usize,
        timestamp: NaiveDateTime,
        field: &'static str,
    },

    #[error("duplicate timestamp {timestamp} at bar {index}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("timestamp {current} at bar {index} is earlier than previous bar {previous}")]
    NonAscendingTimestamp {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),

    #[error("commission rate must be in [0, 1), got {0}")]
    InvalidCommission(f64),
}

/// Ordered bar series with unique, strictly ascending timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validate bars that are already in canonical order.
    pub fn new(bars: Vec<Bar>) -> Result<Self, ValidationError> {
        if bars.is_empty() {
            return Err(ValidationError::EmptySeries);
        }
        for (index, bar) in bars.iter().enumerate() {
            if let Some(field) = bar.invalid_field() {
                return Err(ValidationError::InvalidBar {
                    index,
                    timestamp: bar.timestamp,
                    field,
                });
            }
        }
        for (i, pair) in bars.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if current == previous {
                return Err(ValidationError::DuplicateTimestamp {
                    index: i + 1,
                    timestamp: current,
                });
            }
            if current < previous {
                return Err(ValidationError::NonAscendingTimestamp {
                    index: i + 1,
                    previous,
                    current,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Sort ascending by timestamp, keep the first bar per timestamp, then validate.
    pub fn canonicalize(mut bars: Vec<Bar>) -> Result<Self, ValidationError> {
        // Stable sort keeps file order among equal timestamps, so dedup keeps the first.
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self::new(bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> &Bar {
        &self.bars[0]
    }

    pub fn last(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// Index of the bar at exactly `timestamp`, if any.
    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
    }

    pub fn into_inner(self) -> Vec<Bar> {
        self.bars
    }
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = ValidationError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<BarSeries> for Vec<Bar> {
    fn from(series: BarSeries) -> Self {
        series.bars
    }
}

impl AsRef<[Bar]> for BarSeries {
    fn as_ref(&self) -> &[Bar] {
        &self.bars
    }
}

impl<'a> IntoIterator for &'a BarSeries {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
