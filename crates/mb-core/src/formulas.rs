//! Regime time formulas.
//!
//! Each formula consumes the base cost `T1` and the parameter triple and
//! produces a scalar time value. All of them share the same guard on the
//! logarithm of `U`, see [`safe_log_u`].

use mb_types::{ParamTriple, Regime};
use serde::{Deserialize, Serialize};

/// Substitute offset for `U <= 1`, keeping `ln` away from `ln(0)` and `ln(1) = 0`.
pub const LOG_U_EPSILON: f64 = 1e-9;

/// Number of terms summed when the unwrap series diverges (`|k*P| >= 1`).
///
/// The truncated sum is a deliberately large, deterministic penalty value.
/// Changing this constant changes every divergent unwrap fixture.
pub const UNWRAP_TRUNCATION_TERMS: usize = 12;

/// Output of a time formula.
///
/// `Invalid` marks a formula whose preconditions are unmet (only Wrap with
/// `k*P <= 1`). It is not an error: callers decide how to rank it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeValue {
    Finite(f64),
    Invalid,
}

impl TimeValue {
    pub fn finite(self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Invalid => None,
        }
    }

    pub fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Bare-number projection: `Invalid` becomes `+inf`.
    pub fn or_infinity(self) -> f64 {
        self.finite().unwrap_or(f64::INFINITY)
    }
}

impl From<f64> for TimeValue {
    fn from(value: f64) -> Self {
        Self::Finite(value)
    }
}

/// `ln(U)` with `U <= 1` replaced by `1 + LOG_U_EPSILON`.
pub fn safe_log_u(u: f64) -> f64 {
    let safe_u = if u > 1.0 { u } else { 1.0 + LOG_U_EPSILON };
    safe_u.ln()
}

/// `Σ_{i=0}^{terms-1} first * ratio^i`, summed term by term in index order.
pub fn geometric_partial_sum(first: f64, ratio: f64, terms: usize) -> f64 {
    let mut total = 0.0;
    let mut term = first;
    for _ in 0..terms {
        total += term;
        term *= ratio;
    }
    total
}

/// Wrap (compression): `T1 * ln(U) / (1 - 1/(k*P))`, valid only for `k*P > 1`.
pub fn wrap_time(base_cost: f64, k: f64, p: f64, u: f64) -> TimeValue {
    let kp = k * p;
    // NaN products fail this comparison too and are reported as invalid.
    if !(kp > 1.0) {
        return TimeValue::Invalid;
    }
    let denominator = 1.0 - 1.0 / kp;
    TimeValue::Finite(base_cost * safe_log_u(u) / denominator)
}

/// Steady (homeostasis): `T1 * ln(U)`. Independent of `k` and `P`.
pub fn steady_time(base_cost: f64, u: f64) -> f64 {
    base_cost * safe_log_u(u)
}

/// Unwrap (expansion): geometric series in `k*P`.
///
/// Closed form for `|k*P| < 1`; otherwise the first
/// [`UNWRAP_TRUNCATION_TERMS`] terms of the divergent series.
pub fn unwrap_time(base_cost: f64, k: f64, p: f64, u: f64) -> f64 {
    let kp = k * p;
    let first = base_cost * safe_log_u(u);
    if kp.abs() < 1.0 {
        first / (1.0 - kp)
    } else {
        geometric_partial_sum(first, kp, UNWRAP_TRUNCATION_TERMS)
    }
}

/// Dispatch to the formula of `regime`.
///
/// This is the only place a regime is mapped to its formula.
pub fn regime_value(regime: Regime, base_cost: f64, params: &ParamTriple) -> TimeValue {
    match regime {
        Regime::Wrap => wrap_time(base_cost, params.k, params.p, params.u),
        Regime::Steady => TimeValue::Finite(steady_time(base_cost, params.u)),
        Regime::Unwrap => TimeValue::Finite(unwrap_time(base_cost, params.k, params.p, params.u)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LN_10: f64 = std::f64::consts::LN_10;

    #[test]
    fn wrap_basic() {
        // k*P = 1.2
        let value = wrap_time(1.0, 2.0, 0.6, 10.0).finite().unwrap();
        assert_relative_eq!(value, LN_10 / (1.0 - 1.0 / 1.2), epsilon = 1e-12);
    }

    #[test]
    fn wrap_invalid_product() {
        assert_eq!(wrap_time(1.0, 1.0, 1.0, 10.0), TimeValue::Invalid);
        assert_eq!(wrap_time(1.0, 0.5, 1.0, 10.0), TimeValue::Invalid);
        assert_eq!(wrap_time(1.0, f64::NAN, 1.0, 10.0), TimeValue::Invalid);
        assert_eq!(TimeValue::Invalid.or_infinity(), f64::INFINITY);
    }

    #[test]
    fn wrap_near_singular_product_is_large_but_finite() {
        let value = wrap_time(1.0, 1.0, 1.0 + 1e-9, 10.0).finite().unwrap();
        assert!(value.is_finite());
        assert!(value > 1e8);
    }

    #[test]
    fn steady_basic() {
        assert_relative_eq!(steady_time(1.0, 10.0), LN_10, epsilon = 1e-12);
        assert_relative_eq!(steady_time(2.5, 10.0), 2.5 * LN_10, epsilon = 1e-12);
    }

    #[test]
    fn log_guard_applies_at_and_below_one() {
        let guarded = (1.0 + LOG_U_EPSILON).ln();
        assert_eq!(safe_log_u(1.0), guarded);
        assert_eq!(safe_log_u(0.0), guarded);
        assert_eq!(safe_log_u(-4.0), guarded);
        assert!(safe_log_u(1.0) > 0.0);
        assert_eq!(steady_time(1.0, 0.5), guarded);
        assert_eq!(unwrap_time(1.0, 0.5, 0.5, 0.5), guarded / 0.75);
    }

    #[test]
    fn unwrap_closed_form() {
        // k*P = 0.4
        assert_relative_eq!(unwrap_time(1.0, 0.8, 0.5, 10.0), LN_10 / 0.6, epsilon = 1e-12);
    }

    #[test]
    fn unwrap_closed_form_matches_long_series() {
        for &(k, p) in &[(0.5, 0.5), (0.9, 0.9), (0.3, 0.2), (-0.5, 0.9)] {
            let first = safe_log_u(10.0);
            let series = geometric_partial_sum(first, k * p, 2000);
            assert_relative_eq!(unwrap_time(1.0, k, p, 10.0), series, epsilon = 1e-4);
        }
    }

    #[test]
    fn unwrap_divergent_uses_twelve_terms() {
        let first = safe_log_u(10.0);
        let expected: f64 = (0..12).map(|i| first * 2.0f64.powi(i)).sum();
        // k*P = 2: partial sum is first * (2^12 - 1)
        assert_eq!(unwrap_time(1.0, 2.0, 1.0, 10.0), expected);
        assert_relative_eq!(expected, first * 4095.0, epsilon = 1e-9);
    }

    #[test]
    fn unwrap_at_unit_product_sums_twelve_equal_terms() {
        let first = safe_log_u(10.0);
        assert_relative_eq!(unwrap_time(1.0, 1.0, 1.0, 10.0), 12.0 * first, epsilon = 1e-12);
    }

    #[test]
    fn unwrap_divergent_is_reproducible() {
        let a = unwrap_time(1.5, 3.0, 1.7, 42.0);
        let b = unwrap_time(1.5, 3.0, 1.7, 42.0);
        assert_eq!(a.to_bits(), b.to_bits());
        assert!(a.is_finite());
    }

    #[test]
    fn regime_value_dispatch() {
        let params = ParamTriple::new(2.0, 0.8, 10.0);
        assert_eq!(
            regime_value(Regime::Wrap, 1.0, &params),
            wrap_time(1.0, 2.0, 0.8, 10.0)
        );
        assert_eq!(
            regime_value(Regime::Steady, 1.0, &params),
            TimeValue::Finite(steady_time(1.0, 10.0))
        );
        assert_eq!(
            regime_value(Regime::Unwrap, 1.0, &params),
            TimeValue::Finite(unwrap_time(1.0, 2.0, 0.8, 10.0))
        );
    }

    #[test]
    fn time_value_serialization() {
        assert_eq!(
            serde_json::to_value(TimeValue::Finite(1.5)).unwrap(),
            serde_json::json!({"finite": 1.5})
        );
        assert_eq!(
            serde_json::to_value(TimeValue::Invalid).unwrap(),
            serde_json::json!("invalid")
        );
    }
}
