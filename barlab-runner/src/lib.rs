//! BarLab Runner — backtest orchestration, metrics, config, sweeps, export.
//!
//! This crate builds on `barlab-core` to provide:
//! - Performance metrics and the per-run `PerformanceReport`
//! - TOML backtest configuration
//! - CSV loading for bar series and precomputed signals
//! - Single-backtest runner with run fingerprints
//! - Parallel parameter sweeps with ranking
//! - JSON, CSV and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, DataSource};
pub use data_loader::{load_csv, load_signals_csv, LoadError};
pub use metrics::PerformanceReport;
pub use runner::{
    load_bars, run_backtest, run_from_config, run_prepared, run_signals_file, BacktestResult,
    PreparedBars, RunError, SCHEMA_VERSION, SIGNALS_FILE_SOURCE,
};
pub use sweep::{ParamGrid, ParamSweep, SkippedPoint, SweepMetric, SweepResults, SweepRow};
