use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::MobiusResult;
use crate::invalid_configuration;

/// One of the three tunable axes, in the fixed visitation order k, P, U.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    K,
    P,
    U,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::K, Axis::P, Axis::U];

    pub fn index(self) -> usize {
        match self {
            Self::K => 0,
            Self::P => 1,
            Self::U => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::K => "k",
            Self::P => "P",
            Self::U => "U",
        };
        f.write_str(name)
    }
}

/// The parameter triple (k, P, U): compression rate, parallelism /
/// utilization factor and external scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamTriple {
    pub k: f64,
    #[serde(rename = "P", alias = "p")]
    pub p: f64,
    #[serde(rename = "U", alias = "u")]
    pub u: f64,
}

impl ParamTriple {
    pub fn new(k: f64, p: f64, u: f64) -> Self {
        Self { k, p, u }
    }

    /// The product `k * P` that decides formula validity and convergence.
    pub fn kp(&self) -> f64 {
        self.k * self.p
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::K => self.k,
            Axis::P => self.p,
            Axis::U => self.u,
        }
    }

    /// Copy of `self` with one axis replaced.
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::K => self.k = value,
            Axis::P => self.p = value,
            Axis::U => self.u = value,
        }
        self
    }

    pub fn is_finite(&self) -> bool {
        self.k.is_finite() && self.p.is_finite() && self.u.is_finite()
    }
}

impl fmt::Display for ParamTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(k={}, P={}, U={})", self.k, self.p, self.u)
    }
}

/// Closed interval `[lo, hi]` for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub lo: f64,
    pub hi: f64,
}

impl AxisBounds {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.lo {
            self.lo
        } else if value > self.hi {
            self.hi
        } else {
            value
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    fn validate(&self, axis: Axis) -> MobiusResult<()> {
        if !(self.lo.is_finite() && self.hi.is_finite()) {
            return Err(invalid_configuration!(
                "bounds for {axis} must be finite, got [{}, {}]",
                self.lo,
                self.hi
            ));
        }
        if self.lo > self.hi {
            return Err(invalid_configuration!(
                "bounds for {axis} are inverted: [{}, {}]",
                self.lo,
                self.hi
            ));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for AxisBounds {
    fn from((lo, hi): (f64, f64)) -> Self {
        Self { lo, hi }
    }
}

/// Per-axis search box for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    pub k: AxisBounds,
    #[serde(rename = "P", alias = "p")]
    pub p: AxisBounds,
    #[serde(rename = "U", alias = "u")]
    pub u: AxisBounds,
}

impl ParamBounds {
    pub fn new(k: impl Into<AxisBounds>, p: impl Into<AxisBounds>, u: impl Into<AxisBounds>) -> Self {
        Self {
            k: k.into(),
            p: p.into(),
            u: u.into(),
        }
    }

    pub fn axis(&self, axis: Axis) -> AxisBounds {
        match axis {
            Axis::K => self.k,
            Axis::P => self.p,
            Axis::U => self.u,
        }
    }

    pub fn clamp(&self, params: ParamTriple) -> ParamTriple {
        ParamTriple {
            k: self.k.clamp(params.k),
            p: self.p.clamp(params.p),
            u: self.u.clamp(params.u),
        }
    }

    pub fn contains(&self, params: &ParamTriple) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.axis(axis).contains(params.get(axis)))
    }

    pub fn validate(&self) -> MobiusResult<()> {
        for axis in Axis::ALL {
            self.axis(axis).validate(axis)?;
        }
        Ok(())
    }
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self::new((0.1, 5.0), (0.1, 2.0), (1.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MobiusError;
    use approx::assert_relative_eq;

    #[test]
    fn product_and_axis_access() {
        let params = ParamTriple::new(2.0, 0.8, 10.0);
        assert_relative_eq!(params.kp(), 1.6);
        assert_eq!(params.get(Axis::U), 10.0);
        assert_eq!(params.with(Axis::P, 0.5).p, 0.5);
        assert_eq!(params.p, 0.8);
    }

    #[test]
    fn clamp_into_default_bounds() {
        let bounds = ParamBounds::default();
        let clamped = bounds.clamp(ParamTriple::new(9.0, 0.01, 50.0));
        assert_eq!(clamped, ParamTriple::new(5.0, 0.1, 50.0));
        assert!(bounds.contains(&clamped));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let bounds = ParamBounds::new((0.1, 5.0), (2.0, 0.1), (1.0, 100.0));
        let err = bounds.validate().unwrap_err();
        assert!(matches!(err, MobiusError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("P"));
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let bounds = ParamBounds::new((0.1, 5.0), (0.1, 2.0), (1.0, f64::INFINITY));
        let err = bounds.validate().unwrap_err();
        assert!(matches!(err, MobiusError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("must be finite"));
    }

    #[test]
    fn degenerate_axis_is_allowed() {
        let bounds = ParamBounds::new((1.0, 1.0), (0.1, 2.0), (1.0, 100.0));
        assert!(bounds.validate().is_ok());
        assert_eq!(bounds.k.span(), 0.0);
    }

    #[test]
    fn triple_uses_original_field_names_on_the_wire() {
        let json = serde_json::to_value(ParamTriple::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json, serde_json::json!({"k": 1.0, "P": 2.0, "U": 3.0}));

        let parsed: ParamTriple = serde_json::from_str(r#"{"k":1.0,"p":2.0,"u":3.0}"#).unwrap();
        assert_eq!(parsed, ParamTriple::new(1.0, 2.0, 3.0));
    }
}
