use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{MobiusError, MobiusResult};
use crate::validation_error;

/// One of the three mutually exclusive operating regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Compression; selected at high resilience.
    Wrap,
    /// Homeostasis.
    Steady,
    /// Expansion; selected at low resilience.
    Unwrap,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Wrap, Regime::Steady, Regime::Unwrap];

    /// Conventional signed encoding: Wrap = +1, Steady = 0, Unwrap = -1.
    pub fn sign(self) -> i8 {
        match self {
            Self::Wrap => 1,
            Self::Steady => 0,
            Self::Unwrap => -1,
        }
    }

    pub fn from_sign(sign: i64) -> Option<Self> {
        match sign {
            1 => Some(Self::Wrap),
            0 => Some(Self::Steady),
            -1 => Some(Self::Unwrap),
            _ => None,
        }
    }

    /// Human-readable label used by the request layer.
    pub fn label(self) -> &'static str {
        match self {
            Self::Wrap => "Λ-Wrap",
            Self::Steady => "Λ-Steady",
            Self::Unwrap => "Λ-Unwrap",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wrap => "wrap",
            Self::Steady => "steady",
            Self::Unwrap => "unwrap",
        };
        f.write_str(name)
    }
}

impl FromStr for Regime {
    type Err = MobiusError;

    /// Accepts either the lowercase name or the signed encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wrap" | "+1" | "1" => Ok(Self::Wrap),
            "steady" | "0" => Ok(Self::Steady),
            "unwrap" | "-1" => Ok(Self::Unwrap),
            other => Err(validation_error!("unknown regime: {other}")),
        }
    }
}

/// An ordered pair of resilience thresholds partitioning the axis into
/// `(-inf, low)` → Unwrap, `[low, high)` → Steady, `[high, +inf)` → Wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    low: f64,
    high: f64,
}

impl Thresholds {
    /// Validate the pair. Both must be finite and `low < high`.
    pub fn new(low: f64, high: f64) -> MobiusResult<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(MobiusError::InvalidThresholds { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Regime for `theta`. The upper boundary belongs to Wrap, the lower
    /// boundary to Steady. NaN falls through to Unwrap.
    pub fn classify(&self, theta: f64) -> Regime {
        if theta >= self.high {
            Regime::Wrap
        } else if theta >= self.low {
            Regime::Steady
        } else {
            Regime::Unwrap
        }
    }
}

impl<'de> Deserialize<'de> for Thresholds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            low: f64,
            high: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Thresholds::new(raw.low, raw.high).map_err(serde::de::Error::custom)
    }
}
