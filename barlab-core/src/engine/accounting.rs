//! Fill arithmetic for the single long position.
//!
//! Commission is a flat fraction of value. Entry deploys all cash net of
//! commission; exit realizes `size * close` net of commission.

use chrono::NaiveDateTime;

use crate::domain::{Position, Trade, TradeSide};

/// Open a long position with all available cash at `price`.
///
/// Returns the new position and the Entry trade record.
pub fn enter_long(
    cash: f64,
    price: f64,
    commission_rate: f64,
    timestamp: NaiveDateTime,
) -> (Position, Trade) {
    let size = cash * (1.0 - commission_rate) / price;
    let trade = Trade {
        timestamp,
        side: TradeSide::Entry,
        price,
        size,
        notional_value: size * price,
        commission_paid: cash * commission_rate,
        realized_pl: None,
        realized_pl_pct: None,
        synthetic_close: false,
    };
    (
        Position::Long {
            entry_price: price,
            size,
        },
        trade,
    )
}

/// Close a long position at `price`.
///
/// Returns the cash proceeds and the Exit trade record. `entry_price` is always
/// a validated positive close, so the percentage never divides by zero.
pub fn exit_long(
    entry_price: f64,
    size: f64,
    price: f64,
    commission_rate: f64,
    timestamp: NaiveDateTime,
) -> (f64, Trade) {
    let exit_value = size * price * (1.0 - commission_rate);
    let cost_basis = size * entry_price;
    let realized_pl = exit_value - cost_basis;
    let trade = Trade {
        timestamp,
        side: TradeSide::Exit,
        price,
        size,
        notional_value: exit_value,
        commission_paid: exit_value * commission_rate,
        realized_pl: Some(realized_pl),
        realized_pl_pct: Some(realized_pl / cost_basis * 100.0),
        synthetic_close: false,
    };
    (exit_value, trade)
}

/// Mark-to-market equity: cash while flat, cash plus unrealized P&L while long.
pub fn mark_to_market(cash: f64, position: &Position, close: f64) -> f64 {
    cash + position.unrealized_pl(close)
}
