//! Objective shapes for the parameter search.

use mb_core::{Evaluation, TimeValue};
use mb_types::{invalid_configuration, MobiusError, MobiusResult, ParamTriple, Regime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Added in value mode when a desired regime is supplied and missed.
pub const REGIME_PENALTY: f64 = 1_000.0;

/// Added in state mode when the evaluated regime differs from the desired one.
pub const STATE_PENALTY: f64 = 1_000_000.0;

/// Score given to an invalid (or non-finite) time value. Worse than every
/// finite distance the formulas produce.
pub const INVALID_SCORE: f64 = 1e300;

const SHAPING_WEIGHT: f64 = 0.01;
const TIE_BREAK_WEIGHT: f64 = 0.001;

/// What the search is trying to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveMode {
    /// Bring the time value to a target.
    Value,
    /// Land in a desired regime.
    State,
}

impl fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::State => f.write_str("state"),
        }
    }
}

impl FromStr for ObjectiveMode {
    type Err = MobiusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(Self::Value),
            "state" => Ok(Self::State),
            other => Err(invalid_configuration!(
                "mode must be 'value' or 'state', got '{other}'"
            )),
        }
    }
}

/// Objective of one optimizer run.
///
/// Value mode requires `target`; state mode requires `desired_regime`.
/// A desired regime in value mode turns regime matching into a hard
/// secondary constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub mode: ObjectiveMode,
    pub target: Option<f64>,
    pub desired_regime: Option<Regime>,
}

impl Objective {
    pub fn new(mode: ObjectiveMode, target: Option<f64>, desired_regime: Option<Regime>) -> Self {
        Self {
            mode,
            target,
            desired_regime,
        }
    }

    pub fn value(target: f64) -> Self {
        Self::new(ObjectiveMode::Value, Some(target), None)
    }

    pub fn value_in_regime(target: f64, regime: Regime) -> Self {
        Self::new(ObjectiveMode::Value, Some(target), Some(regime))
    }

    pub fn state(regime: Regime) -> Self {
        Self::new(ObjectiveMode::State, None, Some(regime))
    }

    pub fn validate(&self) -> MobiusResult<()> {
        match self.mode {
            ObjectiveMode::Value => match self.target {
                None => Err(invalid_configuration!("target is required for mode='value'")),
                Some(t) if !t.is_finite() => {
                    Err(invalid_configuration!("target must be finite, got {t}"))
                }
                Some(_) => Ok(()),
            },
            ObjectiveMode::State => match self.desired_regime {
                None => Err(invalid_configuration!(
                    "desired regime is required for mode='state'"
                )),
                Some(_) => Ok(()),
            },
        }
    }

    /// Score of `eval` at `params`; lower is better.
    ///
    /// Callers must have validated the objective.
    pub fn score(&self, eval: &Evaluation, params: &ParamTriple) -> f64 {
        let missed = self
            .desired_regime
            .map_or(false, |desired| desired != eval.regime);

        match self.mode {
            ObjectiveMode::Value => {
                let target = self.target.unwrap_or_default();
                let distance = bounded(eval.value, |v| (v - target).abs());
                if missed {
                    distance + REGIME_PENALTY
                } else {
                    distance
                }
            }
            ObjectiveMode::State => {
                let shaped = bounded(eval.value, |v| {
                    interior_shaping(eval.regime, params.kp()) + tie_break(v)
                });
                if missed {
                    shaped + STATE_PENALTY
                } else {
                    shaped
                }
            }
        }
    }
}

fn bounded(value: TimeValue, f: impl FnOnce(f64) -> f64) -> f64 {
    match value {
        TimeValue::Finite(v) => {
            let score = f(v);
            if score.is_finite() {
                score
            } else {
                INVALID_SCORE
            }
        }
        TimeValue::Invalid => INVALID_SCORE,
    }
}

/// Preferred `k*P` inside each regime's valid region.
fn interior_centre(regime: Regime) -> f64 {
    match regime {
        Regime::Wrap => 2.0,
        Regime::Steady => 1.0,
        Regime::Unwrap => 0.5,
    }
}

// Both shaping terms are squashed below their weight, so the sum never
// exceeds 0.011 whatever the magnitudes involved.
fn interior_shaping(regime: Regime, kp: f64) -> f64 {
    let d = (kp - interior_centre(regime)).abs();
    SHAPING_WEIGHT * d / (1.0 + d)
}

fn tie_break(value: f64) -> f64 {
    let magnitude = value.abs();
    TIE_BREAK_WEIGHT * magnitude / (1.0 + magnitude)
}
