//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Equity curve — one point per bar, same timestamps, same order
//! 2. Trade log — strict Entry/Exit alternation, always ends flat
//! 3. Replay — final capital equals the last exit's notional (or initial capital)
//! 4. Idempotence — identical inputs produce identical results

use barlab_core::domain::{Bar, BarSeries, Signal, TradeSide};
use barlab_core::engine::{run_simulation, EngineConfig};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Enter), Just(Signal::Exit), Just(Signal::Hold)]
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1_000.0_f64, 1..120)
}

fn arb_config() -> impl Strategy<Value = EngineConfig> {
    (100.0..1_000_000.0_f64, 0.0..0.05_f64).prop_map(|(c, r)| EngineConfig::new(c, r))
}

fn arb_run() -> impl Strategy<Value = (Vec<f64>, Vec<Signal>, EngineConfig)> {
    arb_closes().prop_flat_map(|closes| {
        let n = closes.len();
        (
            Just(closes),
            prop::collection::vec(arb_signal(), n),
            arb_config(),
        )
    })
}

fn series(closes: &[f64]) -> BarSeries {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    BarSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(base + Duration::hours(i as i64), c, c, c, c, 0.0))
            .collect(),
    )
    .unwrap()
}

proptest! {
    /// 1. Equity curve has one point per bar, with matching timestamps.
    #[test]
    fn equity_curve_matches_bars((closes, signals, config) in arb_run()) {
        let bars = series(&closes);
        let result = run_simulation(&bars, &signals, &config, None).unwrap();
        prop_assert_eq!(result.equity_curve.len(), bars.len());
        for (point, bar) in result.equity_curve.iter().zip(bars.iter()) {
            prop_assert_eq!(point.timestamp, bar.timestamp);
            prop_assert!(point.equity.is_finite());
        }
    }

    /// 2. Entries and exits strictly alternate, starting with an entry and
    /// ending with an exit.
    #[test]
    fn trades_alternate_and_end_flat((closes, signals, config) in arb_run()) {
        let bars = series(&closes);
        let result = run_simulation(&bars, &signals, &config, None).unwrap();
        prop_assert_eq!(result.trades.len() % 2, 0);
        for (i, trade) in result.trades.iter().enumerate() {
            let expected = if i % 2 == 0 { TradeSide::Entry } else { TradeSide::Exit };
            prop_assert_eq!(trade.side, expected);
        }
        let synthetic = result.trades.iter().filter(|t| t.synthetic_close).count();
        prop_assert!(synthetic <= 1);
        if synthetic == 1 {
            prop_assert!(result.trades.last().unwrap().synthetic_close);
        }
    }

    /// 3. Final capital replays from the trade log.
    #[test]
    fn final_capital_replays((closes, signals, config) in arb_run()) {
        let bars = series(&closes);
        let result = run_simulation(&bars, &signals, &config, None).unwrap();
        match result.trades.iter().rev().find(|t| t.is_exit()) {
            Some(exit) => prop_assert_eq!(result.final_capital, exit.notional_value),
            None => prop_assert_eq!(result.final_capital, config.initial_capital),
        }
    }

    /// 4. Two runs over the same inputs are identical.
    #[test]
    fn runs_are_idempotent((closes, signals, config) in arb_run()) {
        let bars = series(&closes);
        let a = run_simulation(&bars, &signals, &config, None).unwrap();
        let b = run_simulation(&bars, &signals, &config, None).unwrap();
        prop_assert_eq!(a, b);
    }

    /// All-Hold runs never trade and keep equity flat.
    #[test]
    fn all_hold_is_inert(closes in arb_closes(), config in arb_config()) {
        let bars = series(&closes);
        let signals = vec![Signal::Hold; bars.len()];
        let result = run_simulation(&bars, &signals, &config, None).unwrap();
        prop_assert!(result.trades.is_empty());
        prop_assert_eq!(result.final_capital, config.initial_capital);
    }
}
