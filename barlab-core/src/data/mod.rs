//! Bar series producers and transforms: resampling and synthetic data.

pub mod resample;
pub mod synthetic;

pub use resample::{resample, ResampleError, Timeframe};
pub use synthetic::{synthetic_series, SyntheticSpec};
