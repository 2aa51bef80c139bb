//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity values and/or realized P&L in, scalar out.
//! `PerformanceReport::summarize` assembles them into the per-run report.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use barlab_core::domain::{equity_values, EquityPoint, Trade};
use barlab_core::engine::SimulationResult;

/// Trading periods per year used to annualize the Sharpe ratio.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Return standard deviation at or below which returns count as constant.
///
/// Equal period returns computed from float equity still differ by rounding
/// noise near 1e-17; treating that as variance would report a huge Sharpe.
pub const SHARPE_STD_EPSILON: f64 = 1e-15;

/// Calendar days per year used to annualize total return.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Aggregate performance report for a single backtest run.
///
/// Percentages are in percent units (5.0 = 5%). Drawdown is reported as a
/// non-positive percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    /// Completed (exit) trades.
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub win_loss_ratio: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub calmar_ratio: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl PerformanceReport {
    /// Compute the full report.
    ///
    /// Without any completed trade the report is minimal: every statistic is
    /// zero, capitals are echoed, and the equity curve is kept.
    pub fn summarize(
        trades: Vec<Trade>,
        equity_curve: Vec<EquityPoint>,
        initial_capital: f64,
        final_capital: f64,
    ) -> Self {
        let pls: Vec<f64> = trades
            .iter()
            .filter(|t| t.is_exit())
            .map(|t| t.realized_pl.unwrap_or(0.0))
            .collect();

        if pls.is_empty() {
            return Self::minimal(trades, equity_curve, initial_capital, final_capital);
        }

        let equity = equity_values(&equity_curve);
        let total = total_return_pct(initial_capital, final_capital);
        let max_dd = max_drawdown_pct(&equity);
        let days = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => elapsed_days(first.timestamp, last.timestamp),
            _ => 1,
        };
        let annual = annualized_return_pct(total, days);

        let wins: Vec<f64> = pls.iter().copied().filter(|pl| *pl > 0.0).collect();
        let losses: Vec<f64> = pls.iter().copied().filter(|pl| *pl <= 0.0).collect();
        let avg_win = mean_f64(&wins);
        let avg_loss = mean_f64(&losses);

        Self {
            initial_capital,
            final_capital,
            total_return_pct: total,
            annualized_return_pct: annual,
            trade_count: pls.len(),
            win_count: wins.len(),
            loss_count: losses.len(),
            win_rate: wins.len() as f64 / pls.len() as f64,
            avg_win,
            avg_loss,
            win_loss_ratio: win_loss_ratio(avg_win, avg_loss),
            max_drawdown_pct: max_dd,
            sharpe_ratio: sharpe_ratio(&equity),
            calmar_ratio: calmar_ratio(annual, max_dd),
            trades,
            equity_curve,
        }
    }

    /// Report for a finished simulation.
    pub fn from_simulation(result: SimulationResult) -> Self {
        Self::summarize(
            result.trades,
            result.equity_curve,
            result.initial_capital,
            result.final_capital,
        )
    }

    fn minimal(
        trades: Vec<Trade>,
        equity_curve: Vec<EquityPoint>,
        initial_capital: f64,
        final_capital: f64,
    ) -> Self {
        Self {
            initial_capital,
            final_capital,
            total_return_pct: 0.0,
            annualized_return_pct: 0.0,
            trade_count: 0,
            win_count: 0,
            loss_count: 0,
            win_rate: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            win_loss_ratio: 0.0,
            max_drawdown_pct: 0.0,
            sharpe_ratio: 0.0,
            calmar_ratio: 0.0,
            trades,
            equity_curve,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent: (final - initial) / initial * 100.
pub fn total_return_pct(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_capital - initial_capital) / initial_capital * 100.0
}

/// Percent below the running peak at every point (0 at a new high, negative below).
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&eq| {
            peak = peak.max(eq);
            if peak > 0.0 {
                (eq - peak) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Deepest drawdown in percent (e.g., -15.0 = 15% below peak).
///
/// Returns 0.0 if equity never falls below a previous peak.
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    drawdown_series(equity).into_iter().fold(0.0, f64::min)
}

/// Simple per-bar returns: equity[i] / equity[i-1] - 1.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Annualized Sharpe ratio from per-bar returns, risk-free rate zero.
///
/// Sharpe = mean(returns) / sample_std(returns) * sqrt(252).
/// Returns 0.0 with fewer than 2 returns or a std within `SHARPE_STD_EPSILON`.
pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    let returns = period_returns(equity);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std <= SHARPE_STD_EPSILON {
        return 0.0;
    }
    mean_f64(&returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Whole days between two timestamps, at least 1.
pub fn elapsed_days(first: NaiveDateTime, last: NaiveDateTime) -> i64 {
    (last - first).num_days().max(1)
}

/// Linear annualization: total_return_pct / days * 365.
pub fn annualized_return_pct(total_return_pct: f64, days: i64) -> f64 {
    total_return_pct / days.max(1) as f64 * DAYS_PER_YEAR
}

/// Calmar ratio: |annualized return / max drawdown|, 0.0 without a drawdown.
pub fn calmar_ratio(annualized_return_pct: f64, max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct == 0.0 {
        return 0.0;
    }
    (annualized_return_pct / max_drawdown_pct).abs()
}

/// |avg_win / avg_loss|, 0.0 when either side is zero.
pub fn win_loss_ratio(avg_win: f64, avg_loss: f64) -> f64 {
    if avg_win == 0.0 || avg_loss == 0.0 {
        return 0.0;
    }
    (avg_win / avg_loss).abs()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divide by N - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use barlab_core::domain::{Bar, BarSeries, Signal, TradeSide};
    use barlab_core::engine::{run_simulation, EngineConfig};
    use chrono::{Duration, NaiveDate};

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(day)
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint::new(ts(i as i64), v))
            .collect()
    }

    fn exit(pl: f64) -> Trade {
        Trade {
            timestamp: ts(0),
            side: TradeSide::Exit,
            price: 100.0,
            size: 1.0,
            notional_value: 100.0 + pl,
            commission_paid: 0.0,
            realized_pl: Some(pl),
            realized_pl_pct: Some(pl),
            synthetic_close: false,
        }
    }

    // ── Total return ──

    #[test]
    fn total_return_known() {
        assert!((total_return_pct(10_000.0, 11_000.0) - 10.0).abs() < 1e-12);
        assert!((total_return_pct(10_000.0, 9_500.0) + 5.0).abs() < 1e-12);
        assert_eq!(total_return_pct(10_000.0, 10_000.0), 0.0);
    }

    // ── Drawdown ──

    #[test]
    fn drawdown_series_known() {
        let dd = drawdown_series(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert_eq!(dd[0], 0.0);
        assert_eq!(dd[1], 0.0);
        assert!((dd[2] + 25.0).abs() < 1e-12);
        assert_eq!(dd[3], 0.0);
        assert!((dd[4] + 10.0).abs() < 1e-12);
        assert!((max_drawdown_pct(&[100.0, 120.0, 90.0, 130.0, 117.0]) + 25.0).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_increase() {
        assert_eq!(max_drawdown_pct(&[1.0, 2.0, 3.0, 4.0]), 0.0);
    }

    #[test]
    fn max_drawdown_empty() {
        assert_eq!(max_drawdown_pct(&[]), 0.0);
        assert!(drawdown_series(&[]).is_empty());
    }

    // ── Sharpe ──

    #[test]
    fn flat_equity_has_no_drawdown_and_zero_sharpe() {
        let eq = vec![10_000.0; 10];
        assert_eq!(max_drawdown_pct(&eq), 0.0);
        assert_eq!(sharpe_ratio(&eq), 0.0);
    }

    #[test]
    fn sharpe_known_returns() {
        // returns: +10%, -10% → mean 0 → Sharpe 0
        assert!(sharpe_ratio(&[100.0, 110.0, 99.0]).abs() < 1e-12);

        // returns: 1%, 3% → mean 2%, sample std sqrt(2) * 1% → sqrt(252) * 2 / sqrt(2)
        let eq = [100.0, 101.0, 101.0 * 1.03];
        let expected = 252.0_f64.sqrt() * 0.02 / (2.0_f64.sqrt() * 0.01);
        assert!((sharpe_ratio(&eq) - expected).abs() < 1e-9);
    }

    #[test]
    fn constant_growth_has_zero_sharpe() {
        let mut eq = vec![100.0_f64];
        for _ in 0..50 {
            let last = eq[eq.len() - 1];
            eq.push(last * 1.01);
        }
        let returns = period_returns(&eq);
        assert!(returns.iter().all(|r| (r - 0.01).abs() < 1e-12));
        assert_eq!(sharpe_ratio(&eq), 0.0);
    }

    #[test]
    fn sharpe_needs_two_returns() {
        assert_eq!(sharpe_ratio(&[100.0, 110.0]), 0.0);
        assert_eq!(sharpe_ratio(&[100.0]), 0.0);
    }

    #[test]
    fn period_returns_known() {
        let r = period_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }

    // ── Annualization ──

    #[test]
    fn elapsed_days_floors_at_one() {
        assert_eq!(elapsed_days(ts(0), ts(0)), 1);
        assert_eq!(elapsed_days(ts(0), ts(0) + Duration::hours(23)), 1);
        assert_eq!(elapsed_days(ts(0), ts(30)), 30);
        assert_eq!(elapsed_days(ts(0), ts(30) + Duration::hours(12)), 30);
    }

    #[test]
    fn annualized_and_calmar() {
        let annual = annualized_return_pct(10.0, 73);
        assert!((annual - 50.0).abs() < 1e-12);
        assert!((calmar_ratio(annual, -25.0) - 2.0).abs() < 1e-12);
        assert_eq!(calmar_ratio(annual, 0.0), 0.0);
    }

    #[test]
    fn win_loss_ratio_zero_cases() {
        assert_eq!(win_loss_ratio(0.0, -5.0), 0.0);
        assert_eq!(win_loss_ratio(5.0, 0.0), 0.0);
        assert_eq!(win_loss_ratio(6.0, -3.0), 2.0);
    }

    // ── Report ──

    #[test]
    fn no_exits_gives_minimal_report() {
        let report =
            PerformanceReport::summarize(Vec::new(), curve(&[10_000.0; 5]), 10_000.0, 10_000.0);
        assert_eq!(report.trade_count, 0);
        assert_eq!(report.total_return_pct, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.initial_capital, 10_000.0);
        assert_eq!(report.final_capital, 10_000.0);
        assert_eq!(report.equity_curve.len(), 5);
        assert!(report.trades.is_empty());
    }

    #[test]
    fn break_even_counts_as_loss() {
        let trades = vec![exit(50.0), exit(0.0), exit(-25.0), exit(100.0)];
        let report =
            PerformanceReport::summarize(trades, curve(&[1_000.0, 1_125.0]), 1_000.0, 1_125.0);
        assert_eq!(report.trade_count, 4);
        assert_eq!(report.win_count, 2);
        assert_eq!(report.loss_count, 2);
        assert_eq!(report.win_rate, 0.5);
        assert_eq!(report.avg_win, 75.0);
        assert_eq!(report.avg_loss, -12.5);
        assert_eq!(report.win_loss_ratio, 6.0);
    }

    #[test]
    fn flat_equity_report_with_one_trade() {
        let report = PerformanceReport::summarize(
            vec![exit(0.0)],
            curve(&[10_000.0; 10]),
            10_000.0,
            10_000.0,
        );
        assert_eq!(report.max_drawdown_pct, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.calmar_ratio, 0.0);
        assert_eq!(report.win_loss_ratio, 0.0);
    }

    #[test]
    fn report_from_simulation() {
        let bars = BarSeries::new(
            [100.0, 90.0, 95.0, 110.0]
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar::new(ts(i as i64), c, c, c, c, 1.0))
                .collect(),
        )
        .unwrap();
        let signals = [Signal::Enter, Signal::Hold, Signal::Hold, Signal::Exit];
        let config = EngineConfig::new(10_000.0, 0.0);
        let result = run_simulation(&bars, &signals, &config, None).unwrap();
        let report = PerformanceReport::from_simulation(result);

        assert_eq!(report.trade_count, 1);
        assert!((report.final_capital - 11_000.0).abs() < 1e-9);
        assert!((report.total_return_pct - 10.0).abs() < 1e-9);
        assert!((report.max_drawdown_pct + 10.0).abs() < 1e-9);
        // 3 elapsed days
        assert!((report.annualized_return_pct - 10.0 / 3.0 * 365.0).abs() < 1e-6);
        assert!((report.calmar_ratio - report.annualized_return_pct / 10.0).abs() < 1e-6);
        assert!(report.sharpe_ratio.is_finite());
    }
}
