//! Trade — one completed Entry or Exit transaction.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which side of the single tracked position a trade opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Entry,
    Exit,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

/// Immutable record of one transaction.
///
/// Entry and Exit trades alternate strictly in a trade log. `realized_pl` and
/// `realized_pl_pct` are only present on exits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub side: TradeSide,
    pub price: f64,
    pub size: f64,
    /// Entry: `size * price`. Exit: proceeds net of commission.
    pub notional_value: f64,
    pub commission_paid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realized_pl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realized_pl_pct: Option<f64>,
    /// True for the exit forced at the end of the series.
    #[serde(default)]
    pub synthetic_close: bool,
}

impl Trade {
    pub fn is_entry(&self) -> bool {
        self.side == TradeSide::Entry
    }

    pub fn is_exit(&self) -> bool {
        self.side == TradeSide::Exit
    }

    /// A completed trade wins only on strictly positive P&L; break-even is a loss.
    pub fn is_winner(&self) -> bool {
        self.realized_pl.is_some_and(|pl| pl > 0.0)
    }
}
