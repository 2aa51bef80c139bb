//! Strategy parameters: a name-keyed map of numbers or strings.
//!
//! Values arrive from JSON on the command line or TOML config files, so numeric
//! strings are accepted wherever a number is expected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::signal::StrategyError;

/// Single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value. Text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Parameters keyed by name. `BTreeMap` keeps serialization order stable.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Build a `ParamMap` from `(name, value)` pairs.
pub fn param_map<V: Into<ParamValue>>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> ParamMap {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into()))
        .collect()
}

/// Finite number parameter, falling back to `default` when absent.
pub fn number(params: &ParamMap, name: &str, default: f64) -> Result<f64, StrategyError> {
    let Some(raw) = params.get(name) else {
        return Ok(default);
    };
    match raw.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(StrategyError::InvalidParam {
            name: name.to_string(),
            value: raw.to_string(),
            reason: "expected a finite number",
        }),
    }
}

/// Window length parameter: a whole number >= 1.
pub fn period(params: &ParamMap, name: &str, default: usize) -> Result<usize, StrategyError> {
    let Some(raw) = params.get(name) else {
        return Ok(default);
    };
    let invalid = |reason| StrategyError::InvalidParam {
        name: name.to_string(),
        value: raw.to_string(),
        reason,
    };
    let v = raw
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid("expected a number"))?;
    if v.fract() != 0.0 {
        return Err(invalid("expected a whole number"));
    }
    if v < 1.0 {
        return Err(invalid("must be at least 1"));
    }
    Ok(v as usize)
}
