//! Deterministic synthetic bar generation for demos, benches and tests.
//!
//! A seeded random walk: each bar moves the close by up to ±3%, with highs and
//! lows spread up to 1% beyond the open/close range.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, BarSeries, ValidationError};

/// Parameters for a synthetic random walk.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub bars: usize,
    pub seed: u64,
    pub start: NaiveDateTime,
    pub step: Duration,
    pub start_price: f64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            bars: 500,
            seed: 42,
            start: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            step: Duration::days(1),
            start_price: 100.0,
        }
    }
}

impl SyntheticSpec {
    pub fn new(bars: usize, seed: u64) -> Self {
        Self {
            bars,
            seed,
            ..Self::default()
        }
    }
}

/// Generate the series described by `spec`. The same spec always yields the
/// same bars.
pub fn synthetic_series(spec: &SyntheticSpec) -> Result<BarSeries, ValidationError> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut bars = Vec::with_capacity(spec.bars);
    let mut price = spec.start_price;
    let mut timestamp = spec.start;

    for _ in 0..spec.bars {
        let bar_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(Bar::new(timestamp, open, high, low, close, volume));

        price = close;
        timestamp += spec.step;
    }

    BarSeries::new(bars)
}
