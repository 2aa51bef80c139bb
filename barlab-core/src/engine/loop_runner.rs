//! Bar-by-bar simulation loop — the heart of the engine.
//!
//! Per bar, in ascending timestamp order:
//! 1. Mark-to-market at the bar's close and append the equity point
//! 2. Act on the bar's signal (Enter when flat, Exit when long, else nothing)
//! 3. Notify the progress sink at a ~1% stride
//!
//! After the last bar an open position is closed at the final close, so every
//! run ends flat with entries and exits paired.

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    check_alignment, AlignmentError, BarSeries, EquityPoint, Position, Signal, ValidationError,
};

use super::accounting::{enter_long, exit_long, mark_to_market};
use super::progress::{progress_stride, ProgressEvent, ProgressSink};
use super::state::{EngineConfig, SimulationResult, SimulationState};

/// Errors that stop a run before the first bar is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("alignment error: {0}")]
    Alignment(#[from] AlignmentError),
}

/// Run one simulation.
///
/// Inputs are validated up front; on error no partial result exists.
/// The loop itself cannot fail.
pub fn run_simulation(
    bars: &BarSeries,
    signals: &[Signal],
    config: &EngineConfig,
    progress: Option<&dyn ProgressSink>,
) -> Result<SimulationResult, SimError> {
    config.validate()?;
    check_alignment(bars, signals)?;

    let total = bars.len();
    let stride = progress_stride(total);
    let rate = config.commission_rate;
    let mut state = SimulationState::new(config.initial_capital, total);

    debug!(
        bars = total,
        initial_capital = config.initial_capital,
        commission_rate = rate,
        "simulation started"
    );

    for (i, (bar, signal)) in bars.iter().zip(signals).enumerate() {
        let equity = mark_to_market(state.cash, &state.position, bar.close);
        state
            .equity_curve
            .push(EquityPoint::new(bar.timestamp, equity));

        match (*signal, state.position) {
            (Signal::Enter, Position::Flat) => {
                let (position, trade) = enter_long(state.cash, bar.close, rate, bar.timestamp);
                state.position = position;
                state.trades.push(trade);
            }
            (Signal::Exit, Position::Long { entry_price, size }) => {
                let (cash, trade) = exit_long(entry_price, size, bar.close, rate, bar.timestamp);
                state.cash = cash;
                state.position = Position::Flat;
                state.trades.push(trade);
            }
            _ => {}
        }

        if let Some(sink) = progress {
            if i % stride == 0 {
                sink.on_progress(&ProgressEvent {
                    fraction: i as f64 / total as f64,
                    equity,
                    timestamp: bar.timestamp,
                });
            }
        }
    }

    if let Position::Long { entry_price, size } = state.position {
        let last = bars.last();
        let (cash, mut trade) = exit_long(entry_price, size, last.close, rate, last.timestamp);
        trade.synthetic_close = true;
        state.cash = cash;
        state.position = Position::Flat;
        state.trades.push(trade);
    }

    debug!(
        trades = state.trades.len(),
        final_capital = state.cash,
        "simulation finished"
    );

    Ok(SimulationResult {
        trades: state.trades,
        equity_curve: state.equity_curve,
        initial_capital: config.initial_capital,
        final_capital: state.cash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, TradeSide};
    use crate::engine::progress::RecordingProgress;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(day)
    }

    fn series(closes: &[f64]) -> BarSeries {
        BarSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| Bar::new(ts(i as i64), c, c + 1.0, c - 1.0, c, 1_000.0))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn misaligned_signals_fail_fast() {
        let bars = series(&[100.0, 101.0]);
        let err = run_simulation(&bars, &[Signal::Enter], &EngineConfig::default(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Alignment(AlignmentError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn invalid_config_fails_fast() {
        let bars = series(&[100.0]);
        let err = run_simulation(
            &bars,
            &[Signal::Hold],
            &EngineConfig::new(-5.0, 0.001),
            None,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SimError::Validation(ValidationError::InvalidCapital(_))
        ));
    }

    #[test]
    fn equity_is_recorded_before_same_bar_transition() {
        let bars = series(&[100.0, 120.0]);
        let config = EngineConfig::new(1_000.0, 0.0);
        let result =
            run_simulation(&bars, &[Signal::Enter, Signal::Hold], &config, None).unwrap();
        // Bar 0: still flat when equity is recorded.
        assert_eq!(result.equity_curve[0].equity, 1_000.0);
        // Bar 1: long 10 units from 100, marked at 120.
        assert!((result.equity_curve[1].equity - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_signals_are_ignored() {
        let bars = series(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let signals = [
            Signal::Exit,
            Signal::Enter,
            Signal::Enter,
            Signal::Exit,
            Signal::Exit,
        ];
        let result =
            run_simulation(&bars, &signals, &EngineConfig::default(), None).unwrap();
        let sides: Vec<TradeSide> = result.trades.iter().map(|t| t.side).collect();
        assert_eq!(sides, vec![TradeSide::Entry, TradeSide::Exit]);
        assert_eq!(result.trades[0].timestamp, ts(1));
        assert_eq!(result.trades[1].timestamp, ts(3));
        assert!(!result.trades[1].synthetic_close);
    }

    #[test]
    fn open_position_is_closed_at_last_bar() {
        let bars = series(&[100.0, 105.0, 110.0]);
        let signals = [Signal::Hold, Signal::Enter, Signal::Hold];
        let result =
            run_simulation(&bars, &signals, &EngineConfig::default(), None).unwrap();
        assert_eq!(result.trades.len(), 2);
        let exit = &result.trades[1];
        assert!(exit.is_exit());
        assert!(exit.synthetic_close);
        assert_eq!(exit.timestamp, ts(2));
        assert_eq!(exit.price, 110.0);
        assert_eq!(result.final_capital, exit.notional_value);
    }

    #[test]
    fn progress_is_sampled_and_does_not_change_results() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64 * 0.1).collect();
        let bars = series(&closes);
        let mut signals = vec![Signal::Hold; 250];
        signals[10] = Signal::Enter;
        signals[200] = Signal::Exit;

        let sink = RecordingProgress::new();
        let with = run_simulation(&bars, &signals, &EngineConfig::default(), Some(&sink))
            .unwrap();
        let without =
            run_simulation(&bars, &signals, &EngineConfig::default(), None).unwrap();
        assert_eq!(with, without);

        let events = sink.events();
        // stride = 2 → bars 0, 2, ..., 248
        assert_eq!(events.len(), 125);
        assert_eq!(events[0].fraction, 0.0);
        assert_eq!(events[1].timestamp, ts(2));
        assert!(events.windows(2).all(|w| w[0].fraction < w[1].fraction));
        assert!(events.iter().all(|e| e.fraction < 1.0));
    }
}
