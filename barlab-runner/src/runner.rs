//! Backtest runner — wires together data, signal source, engine, and metrics.
//!
//! Entry points:
//! - `run_from_config()`: resolves the data source of a `BacktestConfig`, then runs. Used by the CLI.
//! - `run_signals_file()`: like `run_from_config()`, but signals come from a CSV file.
//! - `run_backtest()`: takes a pre-loaded series and any `SignalSource`. No I/O.
//! - `run_prepared()`: runs against `PreparedBars`, hashed and resampled once. Used by sweeps.

use std::borrow::Cow;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use barlab_core::components::{FnSignalSource, ParamMap, ParamValue, SignalSource, StrategyError};
use barlab_core::data::{resample, synthetic_series, ResampleError, SyntheticSpec, Timeframe};
use barlab_core::domain::{BarSeries, SignalSequence, ValidationError};
use barlab_core::engine::{run_simulation, EngineConfig, ProgressSink, SimError};
use barlab_core::fingerprint::{ConfigHash, DatasetHash, RunFingerprint};

use crate::config::{BacktestConfig, ConfigError, DataSource};
use crate::data_loader::{load_csv, load_signals_csv, LoadError};
use crate::metrics::PerformanceReport;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("resample error: {0}")]
    Resample(#[from] ResampleError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
    #[error("synthetic data error: {0}")]
    Synthetic(#[from] ValidationError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: String,
    pub params: ParamMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    /// Bars simulated, after resampling.
    pub bar_count: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub fingerprint: RunFingerprint,
    pub report: PerformanceReport,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Source name recorded for runs driven by a signal file.
pub const SIGNALS_FILE_SOURCE: &str = "signals_file";

/// Bars hashed and resampled once, ready for any number of runs.
///
/// The dataset hash covers the bars as given; resampling happens after hashing.
#[derive(Debug, Clone)]
pub struct PreparedBars<'a> {
    dataset_hash: DatasetHash,
    timeframe: Option<Timeframe>,
    series: Cow<'a, BarSeries>,
}

impl<'a> PreparedBars<'a> {
    pub fn new(bars: &'a BarSeries, timeframe: Option<Timeframe>) -> Result<Self, RunError> {
        let series = match timeframe {
            Some(tf) => Cow::Owned(resample(bars, tf)?),
            None => Cow::Borrowed(bars),
        };
        Ok(Self {
            dataset_hash: DatasetHash::of(bars),
            timeframe,
            series,
        })
    }

    /// The series signals are generated on.
    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        self.timeframe
    }

    pub fn dataset_hash(&self) -> &DatasetHash {
        &self.dataset_hash
    }
}

/// Run one backtest on pre-loaded bars.
///
/// The timeframe is part of the config hash. Resampling happens before
/// signal generation.
pub fn run_backtest(
    bars: &BarSeries,
    source: &dyn SignalSource,
    params: &ParamMap,
    timeframe: Option<Timeframe>,
    engine: &EngineConfig,
    progress: Option<&dyn ProgressSink>,
) -> Result<BacktestResult, RunError> {
    let prepared = PreparedBars::new(bars, timeframe)?;
    run_prepared(&prepared, source, params, engine, progress)
}

/// Run one backtest on bars that were already hashed and resampled.
pub fn run_prepared(
    prepared: &PreparedBars<'_>,
    source: &dyn SignalSource,
    params: &ParamMap,
    engine: &EngineConfig,
    progress: Option<&dyn ProgressSink>,
) -> Result<BacktestResult, RunError> {
    let timeframe = prepared.timeframe;
    let fingerprint = RunFingerprint::new(
        prepared.dataset_hash.clone(),
        ConfigHash::of(source.name(), params, timeframe, engine),
    );
    let series = prepared.series();

    let signals = source.generate(series, params)?;
    let simulation = run_simulation(series, &signals, engine, progress)?;
    let report = PerformanceReport::from_simulation(simulation);

    info!(
        strategy = source.name(),
        bars = series.len(),
        trades = report.trade_count,
        total_return_pct = report.total_return_pct,
        sharpe = report.sharpe_ratio,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        strategy: source.name().to_string(),
        params: params.clone(),
        timeframe,
        bar_count: series.len(),
        start: series.first().timestamp,
        end: series.last().timestamp,
        fingerprint,
        report,
    })
}

/// Load the bars a config points at.
pub fn load_bars(config: &BacktestConfig) -> Result<BarSeries, RunError> {
    match config.data_source()? {
        DataSource::Csv(path) => Ok(load_csv(&path)?),
        DataSource::Synthetic { bars, seed } => {
            Ok(synthetic_series(&SyntheticSpec::new(bars, seed))?)
        }
    }
}

/// Validate a config, load its data and run it.
pub fn run_from_config(
    config: &BacktestConfig,
    progress: Option<&dyn ProgressSink>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let strategy = config.strategy()?;
    let bars = load_bars(config)?;
    run_backtest(
        &bars,
        &strategy,
        &config.strategy.params,
        config.backtest.timeframe,
        &config.engine_config(),
        progress,
    )
}

/// Validate a config, load its data and run the precomputed signals in `signals`.
///
/// The file is aligned to the bars after resampling. The configured strategy
/// is not used; the run's params record the signal file path.
pub fn run_signals_file(
    config: &BacktestConfig,
    signals: &Path,
    progress: Option<&dyn ProgressSink>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let bars = load_bars(config)?;
    let source = FnSignalSource::new(
        SIGNALS_FILE_SOURCE,
        |series: &BarSeries, _: &ParamMap| -> Result<SignalSequence, StrategyError> {
            load_signals_csv(signals, series).map_err(|e| StrategyError::SourceFailed {
                source_name: SIGNALS_FILE_SOURCE.to_string(),
                reason: e.to_string(),
            })
        },
    );
    let mut params = ParamMap::new();
    params.insert(
        "signals".to_string(),
        ParamValue::Text(signals.display().to_string()),
    );
    run_backtest(
        &bars,
        &source,
        &params,
        config.backtest.timeframe,
        &config.engine_config(),
        progress,
    )
}
