//! Bar resampling to a coarser timeframe.
//!
//! Buckets are anchored at midnight of the first bar's day: with that origin,
//! a bar at `t` lands in the bucket starting at
//! `origin + floor((t - origin) / width) * width`. No bucket starts before the
//! first bar's day, and empty buckets are never emitted.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Bar, BarSeries, ValidationError};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResampleError {
    #[error("invalid timeframe '{0}': expected <n><unit> with unit min, h or d")]
    InvalidTimeframe(String),

    #[error("resampled series is invalid: {0}")]
    Validation(#[from] ValidationError),
}

/// Fixed-width bar interval, stored in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    seconds: i64,
}

impl Timeframe {
    pub fn minutes(n: u32) -> Self {
        Self {
            seconds: i64::from(n) * SECONDS_PER_MINUTE,
        }
    }

    pub fn hours(n: u32) -> Self {
        Self {
            seconds: i64::from(n) * SECONDS_PER_HOUR,
        }
    }

    pub fn days(n: u32) -> Self {
        Self {
            seconds: i64::from(n) * SECONDS_PER_DAY,
        }
    }

    /// Parse `<n><unit>`, e.g. `15m`, `30min`, `1h`, `4H`, `1d`.
    ///
    /// Minute units: `min`, `m`, `t`, `T`. Hour units: `h`, `H`.
    /// Day units: `d`, `D`. A missing count means 1.
    pub fn parse(input: &str) -> Result<Self, ResampleError> {
        let invalid = || ResampleError::InvalidTimeframe(input.to_string());
        let s = input.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let count: u32 = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| invalid())?
        };
        if count == 0 {
            return Err(invalid());
        }

        match unit {
            "min" | "m" | "t" | "T" => Ok(Self::minutes(count)),
            "h" | "H" => Ok(Self::hours(count)),
            "d" | "D" => Ok(Self::days(count)),
            _ => Err(invalid()),
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.seconds)
    }

    /// Start of the bucket containing `timestamp`, for buckets laid out from `origin`.
    pub fn bucket_start(&self, origin: NaiveDateTime, timestamp: NaiveDateTime) -> NaiveDateTime {
        let offset = (timestamp - origin).num_seconds();
        origin + Duration::seconds(offset.div_euclid(self.seconds) * self.seconds)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds % SECONDS_PER_DAY == 0 {
            write!(f, "{}d", self.seconds / SECONDS_PER_DAY)
        } else if self.seconds % SECONDS_PER_HOUR == 0 {
            write!(f, "{}h", self.seconds / SECONDS_PER_HOUR)
        } else {
            write!(f, "{}min", self.seconds / SECONDS_PER_MINUTE)
        }
    }
}

impl FromStr for Timeframe {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = ResampleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

/// Aggregate `bars` into `timeframe` buckets.
///
/// open = first, high = max, low = min, close = last, volume = sum.
/// Each output bar is stamped with its bucket start.
pub fn resample(bars: &BarSeries, timeframe: Timeframe) -> Result<BarSeries, ResampleError> {
    let origin = bars.first().timestamp.date().and_time(NaiveTime::MIN);
    let mut out: Vec<Bar> = Vec::new();

    for bar in bars {
        let bucket = timeframe.bucket_start(origin, bar.timestamp);
        match out.last_mut() {
            Some(current) if current.timestamp == bucket => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => out.push(Bar {
                timestamp: bucket,
                ..bar.clone()
            }),
        }
    }

    Ok(BarSeries::new(out)?)
}
