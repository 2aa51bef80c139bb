//! Criterion benchmarks for BarLab hot paths.
//!
//! Benchmarks:
//! 1. Simulation loop (full run over pre-generated signals)
//! 2. Indicator compute (SMA, EMA, RSI, Bollinger, MACD)
//! 3. Strategy signal generation through the registry
//! 4. Resampling minute bars to coarser timeframes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use barlab_core::components::{Indicator, ParamMap, SignalSource, Strategy};
use barlab_core::data::{resample, synthetic_series, SyntheticSpec, Timeframe};
use barlab_core::domain::{BarSeries, Signal};
use barlab_core::engine::{run_simulation, EngineConfig, NoProgress};
use barlab_core::indicators::{Bollinger, Ema, Macd, MacdLine, Rsi, Sma};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> BarSeries {
    synthetic_series(&SyntheticSpec::new(n, 42)).expect("synthetic series")
}

fn make_signals(n: usize) -> Vec<Signal> {
    (0..n)
        .map(|i| match i % 20 {
            0 => Signal::Enter,
            10 => Signal::Exit,
            _ => Signal::Hold,
        })
        .collect()
}

// ── 1. Simulation Loop ───────────────────────────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_loop");
    let config = EngineConfig::default();

    for &bar_count in &[252, 2_520, 25_200] {
        let bars = make_series(bar_count);
        let signals = make_signals(bar_count);

        group.bench_with_input(
            BenchmarkId::new("no_progress", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| run_simulation(black_box(&bars), black_box(&signals), &config, None));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("noop_sink", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    run_simulation(
                        black_box(&bars),
                        black_box(&signals),
                        &config,
                        Some(&NoProgress),
                    )
                });
            },
        );
    }

    group.finish();
}

// ── 2. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_compute");

    for &bar_count in &[252, 2_520] {
        let bars = make_series(bar_count);

        let full_stack: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(20)),
            Box::new(Sma::new(50)),
            Box::new(Ema::new(12)),
            Box::new(Rsi::new(14)),
            Box::new(Bollinger::upper(20, 2.0)),
            Box::new(Bollinger::lower(20, 2.0)),
            Box::new(Macd::new(12, 26, 9, MacdLine::Signal)),
        ];
        for ind in &full_stack {
            group.bench_with_input(
                BenchmarkId::new(ind.name().to_string(), bar_count),
                &bar_count,
                |b, _| {
                    b.iter(|| ind.compute(black_box(bars.as_slice())));
                },
            );
        }
    }

    group.finish();
}

// ── 3. Strategies ────────────────────────────────────────────────────

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_generate");
    let bars = make_series(2_520);
    let params = ParamMap::new();

    for strategy in Strategy::ALL {
        group.bench_function(strategy.name(), |b| {
            b.iter(|| strategy.generate(black_box(&bars), black_box(&params)));
        });
    }

    group.finish();
}

// ── 4. Resampling ────────────────────────────────────────────────────

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");
    let spec = SyntheticSpec {
        step: chrono::Duration::minutes(1),
        ..SyntheticSpec::new(100_000, 7)
    };
    let minutes = synthetic_series(&spec).expect("synthetic series");

    for label in ["15m", "1h", "1d"] {
        let tf = Timeframe::parse(label).expect("valid timeframe");
        group.bench_function(label, |b| {
            b.iter(|| resample(black_box(&minutes), tf));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_simulation,
    bench_indicators,
    bench_strategies,
    bench_resample
);
criterion_main!(benches);
