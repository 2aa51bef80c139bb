//! BarLab CLI — run backtests, sweep parameters, list strategies, resample data.
//!
//! Commands:
//! - `run` — execute one backtest from a TOML config and/or flags, with a
//!   built-in strategy or a precomputed signal file
//! - `sweep` — run a parameter grid in parallel and rank the results
//! - `strategies` — list built-in strategies with their default parameters
//! - `resample` — aggregate a bar CSV to a coarser timeframe
//!
//! Results go to stdout as JSON; logs go to stderr. On failure the process
//! prints `{"error": true, "message": ...}` to stderr and exits with status 1.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use barlab_core::components::{ParamMap, Strategy};
use barlab_core::data::{resample, Timeframe};
use barlab_core::engine::ProgressEvent;
use barlab_runner::export::{
    export_equity_csv, export_json, export_sweep_csv, export_trades_csv, save_artifacts,
    write_file,
};
use barlab_runner::{
    load_bars, load_csv, run_from_config, run_signals_file, BacktestConfig, ParamGrid,
    ParamSweep, SweepMetric,
};

const DEFAULT_LOG_FILTER: &str = "barlab=info";

#[derive(Parser)]
#[command(
    name = "barlab",
    version,
    about = "BarLab CLI — bar-by-bar strategy backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest. Flags override values from --config.
    Run {
        #[command(flatten)]
        backtest: BacktestArgs,

        /// Precomputed `datetime,signal` CSV to run instead of a built-in strategy.
        #[arg(long, conflicts_with_all = ["strategy", "params"])]
        signals: Option<PathBuf>,

        /// Write the trade log as CSV.
        #[arg(long)]
        trades_csv: Option<PathBuf>,

        /// Write the equity curve as CSV.
        #[arg(long)]
        equity_csv: Option<PathBuf>,

        /// Write the result JSON to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save manifest, CSVs and a Markdown report under this directory.
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },
    /// Run every parameter set of a grid and rank the results.
    Sweep {
        #[command(flatten)]
        backtest: BacktestArgs,

        /// Grid as JSON, e.g. '{"fast_period": [5, 10], "slow_period": [20, 50]}'.
        #[arg(long)]
        grid: String,

        /// Ranking metric: sharpe, total_return, annualized_return, calmar, win_rate, max_drawdown.
        #[arg(long, default_value = "sharpe")]
        rank_by: String,

        /// Number of ranked rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write every row, in grid order, as CSV.
        #[arg(long)]
        output_csv: Option<PathBuf>,
    },
    /// List built-in strategies and their default parameters.
    Strategies,
    /// Resample a bar CSV to a coarser timeframe.
    Resample {
        /// Input CSV with datetime, open, high, low, close, volume columns.
        #[arg(long)]
        input: PathBuf,

        /// Target timeframe, e.g. 15min, 1h, 4h, 1d.
        #[arg(long)]
        timeframe: String,

        /// Output CSV. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Options shared by `run` and `sweep`.
#[derive(Args)]
struct BacktestArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bar CSV file.
    #[arg(long, conflicts_with = "synthetic")]
    dataset: Option<PathBuf>,

    /// Use N synthetic random-walk bars instead of a dataset.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for --synthetic.
    #[arg(long)]
    seed: Option<u64>,

    /// Strategy name: sma_crossover, rsi, bollinger_bands, macd.
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameters as a JSON object, merged over config values.
    #[arg(long)]
    params: Option<String>,

    /// Resample bars to this timeframe before running.
    #[arg(long)]
    timeframe: Option<String>,

    #[arg(long)]
    initial_capital: Option<f64>,

    /// Commission rate per fill, e.g. 0.001 for 0.1%.
    #[arg(long)]
    commission: Option<f64>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            backtest,
            signals,
            trades_csv,
            equity_csv,
            output,
            artifacts_dir,
        } => run_backtest_cmd(
            &backtest,
            signals.as_deref(),
            trades_csv.as_deref(),
            equity_csv.as_deref(),
            output.as_deref(),
            artifacts_dir.as_deref(),
        ),
        Commands::Sweep {
            backtest,
            grid,
            rank_by,
            top,
            output_csv,
        } => run_sweep_cmd(&backtest, &grid, &rank_by, top, output_csv.as_deref()),
        Commands::Strategies => run_strategies_cmd(),
        Commands::Resample {
            input,
            timeframe,
            output,
        } => run_resample_cmd(&input, &timeframe, output.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let body = json!({ "error": true, "message": format!("{e:#}") });
            eprintln!("{body}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the effective config: file first, then flag overrides, then validation.
fn build_config(args: &BacktestArgs) -> Result<BacktestConfig> {
    let mut config = match &args.config {
        Some(path) => BacktestConfig::from_file(path)?,
        None => BacktestConfig::for_strategy(Strategy::SmaCrossover),
    };

    if let Some(name) = &args.strategy {
        let strategy = Strategy::from_name(name)?;
        if strategy.name() != config.strategy.name {
            config.strategy.name = strategy.name().to_string();
            config.strategy.params = ParamMap::new();
        }
    }
    if let Some(raw) = &args.params {
        let overrides: ParamMap =
            serde_json::from_str(raw).context("--params must be a JSON object")?;
        config.strategy.params.extend(overrides);
    }
    if let Some(tf) = &args.timeframe {
        config.backtest.timeframe = Some(Timeframe::parse(tf)?);
    }
    if let Some(capital) = args.initial_capital {
        config.backtest.initial_capital = capital;
    }
    if let Some(rate) = args.commission {
        config.backtest.commission = rate;
    }
    if let Some(path) = &args.dataset {
        config.data.dataset = Some(path.clone());
        config.data.synthetic_bars = None;
    }
    if let Some(bars) = args.synthetic {
        config.data.synthetic_bars = Some(bars);
        config.data.dataset = None;
    }
    if let Some(seed) = args.seed {
        config.data.seed = Some(seed);
    }

    config.validate()?;
    Ok(config)
}

fn run_backtest_cmd(
    args: &BacktestArgs,
    signals: Option<&Path>,
    trades_csv: Option<&Path>,
    equity_csv: Option<&Path>,
    output: Option<&Path>,
    artifacts_dir: Option<&Path>,
) -> Result<()> {
    let config = build_config(args)?;
    let progress = |event: &ProgressEvent| {
        debug!(
            pct = event.fraction * 100.0,
            equity = event.equity,
            at = %event.timestamp,
            "progress"
        );
    };
    let result = match signals {
        Some(path) => run_signals_file(&config, path, Some(&progress))?,
        None => run_from_config(&config, Some(&progress))?,
    };

    if let Some(path) = trades_csv {
        write_file(path, &export_trades_csv(&result.report.trades)?)?;
        info!(path = %path.display(), "trade log written");
    }
    if let Some(path) = equity_csv {
        write_file(path, &export_equity_csv(&result.report.equity_curve)?)?;
        info!(path = %path.display(), "equity curve written");
    }
    if let Some(dir) = artifacts_dir {
        let run_dir = save_artifacts(&result, dir)?;
        info!(path = %run_dir.display(), "artifacts saved");
    }

    let json = export_json(&result)?;
    match output {
        Some(path) => {
            write_file(path, &json)?;
            info!(path = %path.display(), "result written");
        }
        None => print_stdout(&json)?,
    }
    Ok(())
}

fn run_sweep_cmd(
    args: &BacktestArgs,
    grid: &str,
    rank_by: &str,
    top: usize,
    output_csv: Option<&Path>,
) -> Result<()> {
    let config = build_config(args)?;
    let grid: ParamGrid = serde_json::from_str(grid)
        .context("--grid must be a JSON object of parameter name to value list")?;
    let metric: SweepMetric = rank_by.parse().map_err(anyhow::Error::msg)?;
    if grid.size() == 0 {
        bail!("--grid has an empty axis");
    }

    let strategy = config.strategy()?;
    let bars = load_bars(&config)?;
    let results = ParamSweep::new(config.engine_config())
        .with_timeframe(config.backtest.timeframe)
        .sweep(&bars, &strategy, &config.strategy.params, &grid);

    if let Some(path) = output_csv {
        write_file(path, &export_sweep_csv(&results)?)?;
        info!(path = %path.display(), "sweep table written");
    }

    let body = json!({
        "strategy": strategy.name(),
        "rank_by": metric.name(),
        "points": grid.size(),
        "completed": results.len(),
        "top": results.top_n(metric, top),
        "skipped": results.skipped(),
    });
    print_stdout(&serde_json::to_string_pretty(&body)?)
}

fn run_strategies_cmd() -> Result<()> {
    let list: Vec<_> = Strategy::ALL
        .iter()
        .map(|s| {
            json!({
                "name": s.name(),
                "description": s.description(),
                "default_params": s.default_params(),
            })
        })
        .collect();
    print_stdout(&serde_json::to_string_pretty(&list)?)
}

fn run_resample_cmd(input: &Path, timeframe: &str, output: Option<&Path>) -> Result<()> {
    let timeframe = Timeframe::parse(timeframe)?;
    let bars = load_csv(input)?;
    let resampled = resample(&bars, timeframe)?;
    info!(
        input_bars = bars.len(),
        output_bars = resampled.len(),
        %timeframe,
        "resampled"
    );

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["datetime", "open", "high", "low", "close", "volume"])?;
    for bar in &resampled {
        wtr.write_record([
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    let text = String::from_utf8(data).context("CSV output is not valid UTF-8")?;

    match output {
        Some(path) => write_file(path, &text),
        None => print_stdout(&text),
    }
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
