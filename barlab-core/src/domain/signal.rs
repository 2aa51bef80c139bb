//! Directional signals and their alignment to a bar series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::series::BarSeries;

/// Per-bar directional instruction.
///
/// Signals are advisory: the engine honors `Enter` only when flat and `Exit`
/// only when long. Signal strength is deliberately not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Enter,
    Exit,
    #[default]
    Hold,
}

impl Signal {
    /// Map a signed-magnitude encoding onto the three-way signal.
    ///
    /// Positive → Enter, negative → Exit, zero or NaN → Hold.
    pub fn from_strength(value: f64) -> Self {
        if value > 0.0 {
            Self::Enter
        } else if value < 0.0 {
            Self::Exit
        } else {
            Self::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Hold => "hold",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One signal per bar, index-aligned with a `BarSeries`.
pub type SignalSequence = Vec<Signal>;

/// Signal sequence does not line up with the bar series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("signal count {signals} does not match bar count {bars}")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("signal at {0} has no matching bar")]
    UnknownTimestamp(NaiveDateTime),

    #[error("more than one signal at {0}")]
    DuplicateSignal(NaiveDateTime),
}

/// Check that a sequence has exactly one signal per bar.
pub fn check_alignment(bars: &BarSeries, signals: &[Signal]) -> Result<(), AlignmentError> {
    if signals.len() != bars.len() {
        return Err(AlignmentError::LengthMismatch {
            bars: bars.len(),
            signals: signals.len(),
        });
    }
    Ok(())
}

/// Re-index timestamped signals onto the bar series.
///
/// Bars without a signal get `Hold`. Every signal must land on an existing bar
/// timestamp, at most once.
pub fn align_signals(
    bars: &BarSeries,
    timestamped: &[(NaiveDateTime, Signal)],
) -> Result<SignalSequence, AlignmentError> {
    let mut aligned = vec![Signal::Hold; bars.len()];
    let mut seen = HashSet::with_capacity(timestamped.len());

    for &(timestamp, signal) in timestamped {
        if !seen.insert(timestamp) {
            return Err(AlignmentError::DuplicateSignal(timestamp));
        }
        let index = bars
            .index_of(timestamp)
            .ok_or(AlignmentError::UnknownTimestamp(timestamp))?;
        aligned[index] = signal;
    }

    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{Duration, NaiveDate};

    fn ts(day: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(day)
    }

    fn series(n: i64) -> BarSeries {
        BarSeries::new(
            (0..n)
                .map(|d| Bar::new(ts(d), 10.0, 11.0, 9.0, 10.0, 100.0))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn from_strength_uses_sign_only() {
        assert_eq!(Signal::from_strength(0.3), Signal::Enter);
        assert_eq!(Signal::from_strength(42.0), Signal::Enter);
        assert_eq!(Signal::from_strength(-1.0), Signal::Exit);
        assert_eq!(Signal::from_strength(0.0), Signal::Hold);
        assert_eq!(Signal::from_strength(f64::NAN), Signal::Hold);
    }

    #[test]
    fn length_check() {
        let bars = series(3);
        assert!(check_alignment(&bars, &[Signal::Hold; 3]).is_ok());
        assert_eq!(
            check_alignment(&bars, &[Signal::Hold; 2]),
            Err(AlignmentError::LengthMismatch {
                bars: 3,
                signals: 2
            })
        );
    }

    #[test]
    fn align_fills_missing_with_hold() {
        let bars = series(4);
        let aligned =
            align_signals(&bars, &[(ts(3), Signal::Exit), (ts(1), Signal::Enter)]).unwrap();
        assert_eq!(
            aligned,
            vec![Signal::Hold, Signal::Enter, Signal::Hold, Signal::Exit]
        );
    }

    #[test]
    fn align_rejects_unknown_timestamp() {
        let bars = series(2);
        assert_eq!(
            align_signals(&bars, &[(ts(5), Signal::Enter)]),
            Err(AlignmentError::UnknownTimestamp(ts(5)))
        );
    }

    #[test]
    fn align_rejects_duplicates() {
        let bars = series(2);
        assert_eq!(
            align_signals(&bars, &[(ts(0), Signal::Enter), (ts(0), Signal::Exit)]),
            Err(AlignmentError::DuplicateSignal(ts(0)))
        );
    }

    #[test]
    fn signal_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Signal::Enter).unwrap(), "\"enter\"");
        let s: Signal = serde_json::from_str("\"hold\"").unwrap();
        assert_eq!(s, Signal::Hold);
    }
}
