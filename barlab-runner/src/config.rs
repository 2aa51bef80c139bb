//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! initial_capital = 10000.0
//! commission = 0.001
//! timeframe = "1h"
//!
//! [data]
//! dataset = "data/btc_1m.csv"   # or: synthetic_bars = 500, seed = 7
//!
//! [strategy]
//! name = "sma_crossover"
//! [strategy.params]
//! fast_period = 5
//! slow_period = 20
//! ```
//!
//! Every section except `[strategy]` is optional; missing fields take the
//! engine defaults. `validate()` is separate from parsing so callers can
//! apply command-line overrides first.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use barlab_core::components::{ParamMap, Strategy, StrategyError};
use barlab_core::data::Timeframe;
use barlab_core::engine::{EngineConfig, DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_CAPITAL};

/// Seed used when `synthetic_bars` is set without a seed.
pub const DEFAULT_SYNTHETIC_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid strategy config: {0}")]
    Strategy(#[from] StrategyError),
}

/// Complete configuration for one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub data: DataSection,
    pub strategy: StrategySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_commission")]
    pub commission: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission: DEFAULT_COMMISSION_RATE,
            timeframe: None,
        }
    }
}

fn default_initial_capital() -> f64 {
    DEFAULT_INITIAL_CAPITAL
}

fn default_commission() -> f64 {
    DEFAULT_COMMISSION_RATE
}

/// Where the bars come from: a CSV file or a seeded random walk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthetic_bars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    pub name: String,
    #[serde(default)]
    pub params: ParamMap,
}

/// Resolved data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic { bars: usize, seed: u64 },
}

impl BacktestConfig {
    /// Configuration for `strategy` with its default parameters and no data
    /// source yet.
    pub fn for_strategy(strategy: Strategy) -> Self {
        Self {
            backtest: BacktestSection::default(),
            data: DataSection::default(),
            strategy: StrategySection {
                name: strategy.name().to_string(),
                params: strategy.default_params(),
            },
        }
    }

    /// Load a config from a TOML file. The result is not validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. The result is not validated.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check everything that can be checked without loading bars.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let strategy = self.strategy()?;
        strategy.check_params(&self.strategy.params)?;
        self.data_source()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_capital, self.backtest.commission)
    }

    pub fn strategy(&self) -> Result<Strategy, ConfigError> {
        if self.strategy.name.trim().is_empty() {
            return Err(ConfigError::Invalid("strategy name is required".into()));
        }
        Ok(Strategy::from_name(&self.strategy.name)?)
    }

    /// Exactly one of `dataset` and `synthetic_bars` must be set.
    pub fn data_source(&self) -> Result<DataSource, ConfigError> {
        match (&self.data.dataset, self.data.synthetic_bars) {
            (Some(path), None) => Ok(DataSource::Csv(path.clone())),
            (None, Some(0)) => Err(ConfigError::Invalid(
                "synthetic_bars must be at least 1".into(),
            )),
            (None, Some(bars)) => Ok(DataSource::Synthetic {
                bars,
                seed: self.data.seed.unwrap_or(DEFAULT_SYNTHETIC_SEED),
            }),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "set either data.dataset or data.synthetic_bars, not both".into(),
            )),
            (None, None) => Err(ConfigError::Invalid(
                "no data source: set data.dataset or data.synthetic_bars".into(),
            )),
        }
    }
}
