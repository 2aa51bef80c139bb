//! Strategy components.
//!
//! - Indicator trait for precomputed numeric series
//! - Parameter map shared by every strategy
//! - Signal sources: the trait, built-in strategies, and the name registry

pub mod factory;
pub mod indicator;
pub mod params;
pub mod signal;

pub use factory::Strategy;
pub use indicator::Indicator;
pub use params::{ParamMap, ParamValue};
pub use signal::{FnSignalSource, SignalSource, StrategyError};
