//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade log, equity curve, and sweep table for external tools
//! - **Markdown**: human-readable single-run report
//!
//! All persisted artifacts include a `schema_version` field. Versions newer
//! than this build understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use barlab_core::domain::{equity_values, EquityPoint, Trade};

use crate::metrics::drawdown_series;
use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade log as CSV, one row per Entry or Exit.
///
/// Columns: datetime, side, price, size, notional_value, commission_paid,
/// realized_pl, realized_pl_pct, synthetic_close. P&L cells are empty on
/// entries.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "datetime",
        "side",
        "price",
        "size",
        "notional_value",
        "commission_paid",
        "realized_pl",
        "realized_pl_pct",
        "synthetic_close",
    ])?;

    for t in trades {
        wtr.write_record([
            t.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            t.side.as_str().to_string(),
            format!("{:.6}", t.price),
            format!("{:.6}", t.size),
            format!("{:.2}", t.notional_value),
            format!("{:.2}", t.commission_paid),
            t.realized_pl.map(|v| format!("{v:.2}")).unwrap_or_default(),
            t.realized_pl_pct
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            t.synthetic_close.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export an equity curve as CSV with datetime, equity and drawdown_pct columns.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let drawdowns = drawdown_series(&equity_values(equity_curve));
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["datetime", "equity", "drawdown_pct"])?;
    for (point, dd) in equity_curve.iter().zip(&drawdowns) {
        wtr.write_record([
            point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.2}", point.equity),
            format!("{:.4}", dd),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export sweep rows as CSV, grid order. One column per parameter name.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let param_names: Vec<&String> = {
        let mut names: Vec<&String> =
            results.all().iter().flat_map(|r| r.params.keys()).collect();
        names.sort();
        names.dedup();
        names
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header: Vec<&str> = param_names.iter().map(|n| n.as_str()).collect();
    header.extend([
        "total_return_pct",
        "annualized_return_pct",
        "sharpe_ratio",
        "calmar_ratio",
        "max_drawdown_pct",
        "win_rate",
        "trade_count",
        "run_key",
    ]);
    wtr.write_record(&header)?;

    for row in results.all() {
        let mut record: Vec<String> = param_names
            .iter()
            .map(|n| row.params.get(*n).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        record.extend([
            format!("{:.4}", row.total_return_pct),
            format!("{:.4}", row.annualized_return_pct),
            format!("{:.4}", row.sharpe_ratio),
            format!("{:.4}", row.calmar_ratio),
            format!("{:.4}", row.max_drawdown_pct),
            format!("{:.4}", row.win_rate),
            row.trade_count.to_string(),
            row.run_key.clone(),
        ]);
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{strategy}_{run key prefix}/` under `output_dir` containing
/// `manifest.json`, `trades.csv`, `equity.csv` and `report.md`. The same run
/// always maps to the same directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let key = result.fingerprint.key();
    let dirname = format!(
        "{}_{}",
        path_safe(&result.strategy),
        &key[..12.min(key.len())]
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("manifest.json"), &export_json(result)?)?;
    write_file(
        &run_dir.join("trades.csv"),
        &export_trades_csv(&result.report.trades)?,
    )?;
    write_file(
        &run_dir.join("equity.csv"),
        &export_equity_csv(&result.report.equity_curve)?,
    )?;
    write_file(&run_dir.join("report.md"), &generate_report(result))?;

    Ok(run_dir)
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
fn path_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let r = &result.report;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    if !result.params.is_empty() {
        let params: Vec<String> = result
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        md.push_str(&format!("| Parameters | {} |\n", params.join(", ")));
    }
    if let Some(tf) = result.timeframe {
        md.push_str(&format!("| Timeframe | {tf} |\n"));
    }
    md.push_str(&format!("| Period | {} to {} |\n", result.start, result.end));
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    md.push_str(&format!(
        "| Dataset Hash | {} |\n",
        result.fingerprint.dataset_hash
    ));
    md.push_str(&format!(
        "| Config Hash | {} |\n",
        result.fingerprint.config_hash
    ));
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Capital | {:.2} |\n", r.initial_capital));
    md.push_str(&format!("| Final Capital | {:.2} |\n", r.final_capital));
    md.push_str(&format!("| Total Return | {:.2}% |\n", r.total_return_pct));
    md.push_str(&format!(
        "| Annualized Return | {:.2}% |\n",
        r.annualized_return_pct
    ));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", r.max_drawdown_pct));
    md.push_str(&format!("| Sharpe | {:.3} |\n", r.sharpe_ratio));
    md.push_str(&format!("| Calmar | {:.3} |\n", r.calmar_ratio));
    md.push('\n');

    md.push_str("## Trades\n\n");
    if r.trade_count == 0 {
        md.push_str("No completed trades.\n");
        return md;
    }
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Completed | {} ({} wins, {} losses) |\n",
        r.trade_count, r.win_count, r.loss_count
    ));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", r.win_rate * 100.0));
    md.push_str(&format!("| Avg Win | {:.2} |\n", r.avg_win));
    md.push_str(&format!("| Avg Loss | {:.2} |\n", r.avg_loss));
    md.push_str(&format!("| Win/Loss Ratio | {:.3} |\n", r.win_loss_ratio));

    md
}
