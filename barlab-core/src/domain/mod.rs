//! Domain types for BarLab

pub mod bar;
pub mod equity;
pub mod position;
pub mod series;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use equity::{equity_values, EquityPoint};
pub use position::Position;
pub use series::{BarSeries, ValidationError};
pub use signal::{align_signals, check_alignment, AlignmentError, Signal, SignalSequence};
pub use trade::{Trade, TradeSide};
