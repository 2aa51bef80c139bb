//! Parameter sweeps: one signal source, one bar series, a grid of parameter sets.
//!
//! The bars are hashed and resampled once per sweep. Each grid point is then an
//! independent `run_prepared` call with its own engine state, so points run in
//! parallel on the rayon pool. Results come back in
//! grid order regardless of scheduling. Points whose parameters the source
//! rejects are skipped and recorded, never fatal.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use barlab_core::components::{ParamMap, ParamValue, SignalSource};
use barlab_core::data::Timeframe;
use barlab_core::domain::BarSeries;
use barlab_core::engine::EngineConfig;

use crate::runner::{run_prepared, BacktestResult, PreparedBars};

/// Values to try per parameter name.
///
/// Axes are iterated in name order with the last axis varying fastest, so the
/// expansion order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid {
    axes: BTreeMap<String, Vec<ParamValue>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) one axis.
    pub fn axis<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.axes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of parameter sets in the grid. An empty axis empties the grid;
    /// a grid with no axes has exactly one point (the base parameters).
    pub fn size(&self) -> usize {
        self.axes.values().map(Vec::len).product()
    }

    /// Expand the grid over `base`. Grid values override base values.
    pub fn combinations(&self, base: &ParamMap) -> Vec<ParamMap> {
        let mut combos = vec![base.clone()];
        for (name, values) in &self.axes {
            combos = combos
                .iter()
                .flat_map(|combo| {
                    values.iter().map(move |value| {
                        let mut next = combo.clone();
                        next.insert(name.clone(), value.clone());
                        next
                    })
                })
                .collect();
        }
        combos
    }
}

/// Metric used to rank sweep rows. Higher is better for every variant;
/// drawdown is non-positive, so the shallowest drawdown ranks first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMetric {
    #[default]
    Sharpe,
    TotalReturn,
    AnnualizedReturn,
    Calmar,
    WinRate,
    MaxDrawdown,
}

impl SweepMetric {
    pub const ALL: [SweepMetric; 6] = [
        SweepMetric::Sharpe,
        SweepMetric::TotalReturn,
        SweepMetric::AnnualizedReturn,
        SweepMetric::Calmar,
        SweepMetric::WinRate,
        SweepMetric::MaxDrawdown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sharpe => "sharpe",
            Self::TotalReturn => "total_return",
            Self::AnnualizedReturn => "annualized_return",
            Self::Calmar => "calmar",
            Self::WinRate => "win_rate",
            Self::MaxDrawdown => "max_drawdown",
        }
    }

    pub fn extract(&self, row: &SweepRow) -> f64 {
        match self {
            Self::Sharpe => row.sharpe_ratio,
            Self::TotalReturn => row.total_return_pct,
            Self::AnnualizedReturn => row.annualized_return_pct,
            Self::Calmar => row.calmar_ratio,
            Self::WinRate => row.win_rate,
            Self::MaxDrawdown => row.max_drawdown_pct,
        }
    }
}

impl fmt::Display for SweepMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == key)
            .ok_or_else(|| format!("unknown sweep metric '{s}'"))
    }
}

/// Summary of one grid point. The full trade log and equity curve are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub params: ParamMap,
    pub run_key: String,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate: f64,
    pub trade_count: usize,
}

impl SweepRow {
    pub fn from_result(result: &BacktestResult) -> Self {
        let report = &result.report;
        Self {
            params: result.params.clone(),
            run_key: result.fingerprint.key(),
            total_return_pct: report.total_return_pct,
            annualized_return_pct: report.annualized_return_pct,
            sharpe_ratio: report.sharpe_ratio,
            calmar_ratio: report.calmar_ratio,
            max_drawdown_pct: report.max_drawdown_pct,
            win_rate: report.win_rate,
            trade_count: report.trade_count,
        }
    }
}

/// Grid point that could not be run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPoint {
    pub params: ParamMap,
    pub reason: String,
}

/// Parameter sweep executor.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    engine: EngineConfig,
    timeframe: Option<Timeframe>,
    parallel: bool,
}

impl ParamSweep {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            timeframe: None,
            parallel: true,
        }
    }

    pub fn with_timeframe(mut self, timeframe: Option<Timeframe>) -> Self {
        self.timeframe = timeframe;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every grid point.
    pub fn sweep(
        &self,
        bars: &BarSeries,
        source: &dyn SignalSource,
        base: &ParamMap,
        grid: &ParamGrid,
    ) -> SweepResults {
        self.sweep_with_progress(bars, source, base, grid, |_, _, _| {})
    }

    /// Run every grid point, calling `progress_callback(index, total, row)`
    /// after each successful point. Calls may arrive out of order.
    pub fn sweep_with_progress<F>(
        &self,
        bars: &BarSeries,
        source: &dyn SignalSource,
        base: &ParamMap,
        grid: &ParamGrid,
        progress_callback: F,
    ) -> SweepResults
    where
        F: Fn(usize, usize, &SweepRow) + Send + Sync,
    {
        let combos = grid.combinations(base);
        let total = combos.len();

        let prepared = match PreparedBars::new(bars, self.timeframe) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(strategy = source.name(), error = %e, "sweep data could not be prepared");
                let reason = e.to_string();
                let skipped = combos
                    .into_iter()
                    .map(|params| SkippedPoint {
                        params,
                        reason: reason.clone(),
                    })
                    .collect();
                return SweepResults {
                    rows: Vec::new(),
                    skipped,
                };
            }
        };

        let run_point = |(idx, params): (usize, &ParamMap)| -> Result<SweepRow, SkippedPoint> {
            match run_prepared(&prepared, source, params, &self.engine, None) {
                Ok(result) => {
                    let row = SweepRow::from_result(&result);
                    progress_callback(idx, total, &row);
                    Ok(row)
                }
                Err(e) => {
                    warn!(
                        strategy = source.name(),
                        point = idx,
                        error = %e,
                        "sweep point skipped"
                    );
                    Err(SkippedPoint {
                        params: params.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        };

        let outcomes: Vec<Result<SweepRow, SkippedPoint>> = if self.parallel {
            combos.par_iter().enumerate().map(run_point).collect()
        } else {
            combos.iter().enumerate().map(run_point).collect()
        };

        let mut rows = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(point) => skipped.push(point),
            }
        }

        info!(
            strategy = source.name(),
            points = total,
            completed = rows.len(),
            skipped = skipped.len(),
            "sweep complete"
        );

        SweepResults { rows, skipped }
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    rows: Vec<SweepRow>,
    skipped: Vec<SkippedPoint>,
}

impl SweepResults {
    pub fn all(&self) -> &[SweepRow] {
        &self.rows
    }

    pub fn skipped(&self) -> &[SkippedPoint] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by `metric`, best first. Ties keep grid order.
    pub fn sorted_by(&self, metric: SweepMetric) -> Vec<&SweepRow> {
        let mut sorted: Vec<_> = self.rows.iter().collect();
        sorted.sort_by(|a, b| {
            metric
                .extract(b)
                .partial_cmp(&metric.extract(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn top_n(&self, metric: SweepMetric, n: usize) -> Vec<&SweepRow> {
        self.sorted_by(metric).into_iter().take(n).collect()
    }

    pub fn best(&self, metric: SweepMetric) -> Option<&SweepRow> {
        self.sorted_by(metric).into_iter().next()
    }
}
