//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Strategies compute them once over the whole series before deriving signals.

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, Bollinger, Ema, Macd, MacdLine, Rsi, Sma};

    fn all_indicators() -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::new(5)),
            Box::new(Ema::new(5)),
            Box::new(Rsi::new(5)),
            Box::new(Bollinger::upper(5, 2.0)),
            Box::new(Bollinger::lower(5, 2.0)),
            Box::new(Macd::new(3, 6, 4, MacdLine::Macd)),
            Box::new(Macd::new(3, 6, 4, MacdLine::Signal)),
        ]
    }

    #[test]
    fn output_length_matches_input() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let bars = make_bars(&closes);
        for ind in all_indicators() {
            assert_eq!(ind.compute(&bars).len(), bars.len(), "{}", ind.name());
        }
    }

    #[test]
    fn warmup_values_are_nan() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let bars = make_bars(&closes);
        for ind in all_indicators() {
            let values = ind.compute(&bars);
            for (i, v) in values.iter().take(ind.lookback()).enumerate() {
                assert!(v.is_nan(), "{} bar {i} should be warmup", ind.name());
            }
        }
    }

    #[test]
    fn no_lookahead_truncated_vs_full() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 8.0 + i as f64 * 0.1)
            .collect();
        let bars = make_bars(&closes);
        for ind in all_indicators() {
            let full = ind.compute(&bars);
            for cut in [10, 25, 40] {
                let truncated = ind.compute(&bars[..cut]);
                for i in 0..cut {
                    let (a, b) = (truncated[i], full[i]);
                    assert!(
                        (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9,
                        "{} differs at bar {i} when truncated to {cut}",
                        ind.name()
                    );
                }
            }
        }
    }
}
