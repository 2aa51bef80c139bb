//! The single tracked position.

use serde::{Deserialize, Serialize};

/// Engine-internal position state. There is no short state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long { entry_price: f64, size: f64 },
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat)
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Self::Long { .. })
    }

    /// Unrealized P&L at `price`; zero when flat.
    pub fn unrealized_pl(&self, price: f64) -> f64 {
        match *self {
            Self::Flat => 0.0,
            Self::Long { entry_price, size } => size * (price - entry_price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrealized_pl() {
        let pos = Position::Long {
            entry_price: 100.0,
            size: 2.0,
        };
        assert_eq!(pos.unrealized_pl(105.0), 10.0);
        assert_eq!(pos.unrealized_pl(95.0), -10.0);
        assert_eq!(Position::Flat.unrealized_pl(500.0), 0.0);
    }

    #[test]
    fn default_is_flat() {
        assert!(Position::default().is_flat());
    }
}
