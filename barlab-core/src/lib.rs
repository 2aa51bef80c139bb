//! BarLab Core — domain types, simulation engine, indicators, strategies, data transforms.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (bars, series, signals, trades, equity points, positions)
//! - Bar-by-bar simulation loop for a single long/flat position
//! - Indicator trait and concrete indicators (SMA, EMA, RSI, Bollinger, MACD)
//! - Signal sources: built-in strategies behind a name-keyed registry
//! - Resampling and synthetic data generation
//! - BLAKE3 run fingerprints

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;

pub use components::{FnSignalSource, ParamMap, ParamValue, SignalSource, Strategy, StrategyError};
pub use domain::{
    align_signals, Bar, BarSeries, EquityPoint, Signal, SignalSequence, Trade, TradeSide,
};
pub use engine::{run_simulation, EngineConfig, ProgressEvent, ProgressSink, SimError, SimulationResult};
