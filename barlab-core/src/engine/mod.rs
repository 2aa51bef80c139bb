//! Simulation engine — bar-by-bar position state machine.
//!
//! The engine consumes a validated `BarSeries` and one `Signal` per bar, then
//! runs a single long/flat position through the series:
//!
//! 1. Mark-to-market equity at the bar's close
//! 2. Enter on `Enter` when flat, exit on `Exit` when long
//! 3. Optional progress notification
//!
//! Each run owns a fresh `SimulationState`; runs share nothing.

pub mod accounting;
pub mod loop_runner;
pub mod progress;
pub mod state;

pub use accounting::{enter_long, exit_long, mark_to_market};
pub use loop_runner::{run_simulation, SimError};
pub use progress::{
    progress_stride, ChannelProgress, NoProgress, ProgressEvent, ProgressSink, RecordingProgress,
};
pub use state::{
    EngineConfig, SimulationResult, SimulationState, DEFAULT_COMMISSION_RATE,
    DEFAULT_INITIAL_CAPITAL,
};
