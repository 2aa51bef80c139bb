//! Run fingerprinting — deterministic identification of datasets and run configurations.
//!
//! - `DatasetHash`: BLAKE3 over every bar's timestamp and OHLCV values.
//! - `ConfigHash`: BLAKE3 over strategy name, parameters, timeframe, capital and commission.
//! - `RunFingerprint`: both hashes together, the key a result cache would use.
//!
//! Field values are fed to the hasher with explicit separators and little-endian
//! float bytes, so the hash does not depend on any serializer's formatting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::ParamMap;
use crate::components::ParamValue;
use crate::data::Timeframe;
use crate::domain::BarSeries;
use crate::engine::EngineConfig;

/// Content hash of a bar series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of(bars: &BarSeries) -> Self {
        let mut hasher = blake3::Hasher::new();
        for bar in bars {
            hasher.update(bar.timestamp.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of everything that shapes a run besides the bars themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    /// Parameters are hashed in key order (`ParamMap` is a `BTreeMap`).
    pub fn of(
        strategy: &str,
        params: &ParamMap,
        timeframe: Option<Timeframe>,
        config: &EngineConfig,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"strategy\0");
        hasher.update(strategy.as_bytes());
        for (name, value) in params {
            hasher.update(b"\0param\0");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            match value {
                ParamValue::Number(v) => {
                    hasher.update(b"n");
                    hasher.update(&v.to_le_bytes());
                }
                ParamValue::Text(s) => {
                    hasher.update(b"s");
                    hasher.update(s.as_bytes());
                }
            }
        }
        hasher.update(b"\0timeframe\0");
        if let Some(tf) = timeframe {
            hasher.update(&tf.seconds().to_le_bytes());
        }
        hasher.update(b"\0capital\0");
        hasher.update(&config.initial_capital.to_le_bytes());
        hasher.update(b"\0commission\0");
        hasher.update(&config.commission_rate.to_le_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub dataset_hash: DatasetHash,
    pub config_hash: ConfigHash,
}

impl RunFingerprint {
    pub fn new(dataset_hash: DatasetHash, config_hash: ConfigHash) -> Self {
        Self {
            dataset_hash,
            config_hash,
        }
    }

    /// Single combined key.
    pub fn key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.dataset_hash.0.as_bytes());
        hasher.update(b":");
        hasher.update(self.config_hash.0.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::params::param_map;
    use crate::data::{synthetic_series, SyntheticSpec};

    fn config_hash(params: &ParamMap, capital: f64) -> ConfigHash {
        ConfigHash::of(
            "sma_crossover",
            params,
            None,
            &EngineConfig::new(capital, 0.001),
        )
    }

    #[test]
    fn dataset_hash_is_deterministic_and_content_sensitive() {
        let a = synthetic_series(&SyntheticSpec::new(100, 3)).unwrap();
        let b = synthetic_series(&SyntheticSpec::new(100, 3)).unwrap();
        let c = synthetic_series(&SyntheticSpec::new(100, 4)).unwrap();
        assert_eq!(DatasetHash::of(&a), DatasetHash::of(&b));
        assert_ne!(DatasetHash::of(&a), DatasetHash::of(&c));
        assert_eq!(DatasetHash::of(&a).0.len(), 64);
    }

    #[test]
    fn config_hash_covers_params_and_capital() {
        let p1 = param_map([("fast_period", 5usize), ("slow_period", 20)]);
        let p2 = param_map([("fast_period", 6usize), ("slow_period", 20)]);
        assert_eq!(config_hash(&p1, 10_000.0), config_hash(&p1, 10_000.0));
        assert_ne!(config_hash(&p1, 10_000.0), config_hash(&p2, 10_000.0));
        assert_ne!(config_hash(&p1, 10_000.0), config_hash(&p1, 20_000.0));
    }

    #[test]
    fn config_hash_distinguishes_text_from_number() {
        let num = param_map([("period", 14usize)]);
        let text = param_map([("period", "14")]);
        assert_ne!(config_hash(&num, 1.0), config_hash(&text, 1.0));
    }

    #[test]
    fn config_hash_covers_timeframe() {
        let params = ParamMap::new();
        let config = EngineConfig::default();
        let none = ConfigHash::of("rsi", &params, None, &config);
        let hourly = ConfigHash::of("rsi", &params, Some(Timeframe::hours(1)), &config);
        assert_ne!(none, hourly);
    }

    #[test]
    fn fingerprint_key_is_stable() {
        let fp = RunFingerprint::new(DatasetHash("a".into()), ConfigHash("b".into()));
        assert_eq!(fp.key(), fp.clone().key());
        let other = RunFingerprint::new(DatasetHash("a".into()), ConfigHash("c".into()));
        assert_ne!(fp.key(), other.key());
    }
}
