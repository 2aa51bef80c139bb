//! Integration tests for signal sources feeding the engine.
//!
//! Tests:
//! 1. Look-ahead guard: signals on a truncated series equal the prefix of the full run
//! 2. Every built-in strategy runs end to end on synthetic data
//! 3. User-defined sources through `FnSignalSource`
//! 4. Resampled series feed strategies like any other series

use barlab_core::components::params::{param_map, period};
use barlab_core::components::{FnSignalSource, ParamMap, SignalSource, Strategy, StrategyError};
use barlab_core::data::{resample, synthetic_series, SyntheticSpec, Timeframe};
use barlab_core::domain::{BarSeries, Signal};
use barlab_core::engine::{run_simulation, EngineConfig};
use chrono::Duration;

fn synthetic(n: usize, seed: u64) -> BarSeries {
    synthetic_series(&SyntheticSpec::new(n, seed)).unwrap()
}

fn short_params(strategy: Strategy) -> ParamMap {
    match strategy {
        Strategy::SmaCrossover => param_map([("fast_period", 5usize), ("slow_period", 20)]),
        Strategy::Rsi => param_map([("period", 7usize)]),
        Strategy::BollingerBands => param_map([("period", 10usize)]),
        Strategy::Macd => param_map([
            ("fast_period", 5usize),
            ("slow_period", 13),
            ("signal_period", 4),
        ]),
    }
}

// ── 1. Look-ahead guard ──────────────────────────────────────────────

#[test]
fn signals_do_not_depend_on_future_bars() {
    let full = synthetic(250, 21);
    for strategy in Strategy::ALL {
        let params = short_params(strategy);
        let full_signals = strategy.generate(&full, &params).unwrap();
        for cut in [40, 120, 200] {
            let truncated = BarSeries::new(full.as_slice()[..cut].to_vec()).unwrap();
            let partial = strategy.generate(&truncated, &params).unwrap();
            assert_eq!(
                partial,
                full_signals[..cut].to_vec(),
                "{strategy} looked ahead when truncated to {cut} bars"
            );
        }
    }
}

// ── 2. End to end ────────────────────────────────────────────────────

#[test]
fn every_strategy_backtests_on_synthetic_data() {
    let bars = synthetic(500, 8);
    for strategy in Strategy::ALL {
        let signals = strategy.generate(&bars, &short_params(strategy)).unwrap();
        let result = run_simulation(&bars, &signals, &EngineConfig::default(), None).unwrap();
        assert_eq!(result.equity_curve.len(), bars.len());
        assert!(result.final_capital.is_finite() && result.final_capital > 0.0);
    }
}

#[test]
fn short_series_produces_no_trades_for_long_windows() {
    let bars = synthetic(30, 1);
    let signals = Strategy::SmaCrossover
        .generate(&bars, &ParamMap::new())
        .unwrap();
    assert!(signals.iter().all(|s| *s == Signal::Hold));
}

// ── 3. User-defined sources ──────────────────────────────────────────

#[test]
fn closure_source_drives_the_engine() {
    let every_n = FnSignalSource::new(
        "every_n",
        |bars: &BarSeries, params: &ParamMap| -> Result<Vec<Signal>, StrategyError> {
            let n = period(params, "n", 5)?;
            Ok((0..bars.len())
                .map(|i| match i % (2 * n) {
                    0 => Signal::Enter,
                    x if x == n => Signal::Exit,
                    _ => Signal::Hold,
                })
                .collect())
        },
    );

    let bars = synthetic(40, 2);
    let signals = every_n.generate(&bars, &param_map([("n", 4usize)])).unwrap();
    let result = run_simulation(&bars, &signals, &EngineConfig::default(), None).unwrap();
    assert_eq!(result.completed_trades(), 5);

    let err = every_n
        .generate(&bars, &param_map([("n", "zero")]))
        .unwrap_err();
    assert!(matches!(err, StrategyError::InvalidParam { .. }));
}

// ── 4. Resampling ────────────────────────────────────────────────────

#[test]
fn hourly_strategy_on_minute_bars() {
    let spec = SyntheticSpec {
        step: Duration::minutes(1),
        ..SyntheticSpec::new(600, 4)
    };
    let minutes = synthetic_series(&spec).unwrap();
    let hourly = resample(&minutes, Timeframe::parse("1h").unwrap()).unwrap();
    assert_eq!(hourly.len(), 10);
    let volume: f64 = minutes.iter().map(|b| b.volume).sum();
    let resampled_volume: f64 = hourly.iter().map(|b| b.volume).sum();
    assert!((volume - resampled_volume).abs() < 1e-6);

    let signals = Strategy::Rsi
        .generate(&hourly, &param_map([("period", 3usize)]))
        .unwrap();
    let result = run_simulation(&hourly, &signals, &EngineConfig::default(), None).unwrap();
    assert_eq!(result.equity_curve.len(), 10);
}
