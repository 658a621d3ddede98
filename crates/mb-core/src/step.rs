//! Single-step evaluation: arbiter decision followed by the matching formula.

use mb_types::{MobiusResult, ParamTriple, Regime, Thresholds};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::formulas::{regime_value, TimeValue};

/// Result of one evaluator call. The value was computed by the formula of
/// `regime`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub value: TimeValue,
    pub regime: Regime,
}

impl Evaluation {
    pub fn value_or_infinity(&self) -> f64 {
        self.value.or_infinity()
    }
}

/// Evaluate the time value for `params` at resilience `theta`.
pub fn evaluate(
    params: &ParamTriple,
    theta: f64,
    thresholds: &Thresholds,
    base_cost: f64,
) -> Evaluation {
    let regime = thresholds.classify(theta);
    let value = regime_value(regime, base_cost, params);
    trace!(%params, theta, %regime, ?value, "evaluated step");
    Evaluation { value, regime }
}

/// Unvalidated-threshold entry point. Surfaces `InvalidThresholds` when
/// `low >= high`.
pub fn evaluate_raw(
    k: f64,
    p: f64,
    u: f64,
    theta: f64,
    low: f64,
    high: f64,
    base_cost: f64,
) -> MobiusResult<Evaluation> {
    let thresholds = Thresholds::new(low, high)?;
    Ok(evaluate(&ParamTriple::new(k, p, u), theta, &thresholds, base_cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::select;
    use crate::formulas::{steady_time, unwrap_time, wrap_time};
    use approx::assert_relative_eq;
    use mb_types::MobiusError;
    use proptest::prelude::*;

    #[test]
    fn wrap_scenario() {
        let eval = evaluate_raw(2.0, 0.8, 10.0, 0.9, 0.3, 0.7, 1.0).unwrap();
        assert_eq!(eval.regime, Regime::Wrap);
        assert_relative_eq!(eval.value.finite().unwrap(), 6.140_226, epsilon = 1e-5);
        assert_eq!(eval.value, wrap_time(1.0, 2.0, 0.8, 10.0));
    }

    #[test]
    fn steady_scenario() {
        let eval = evaluate_raw(2.0, 0.8, 10.0, 0.5, 0.3, 0.7, 1.0).unwrap();
        assert_eq!(eval.regime, Regime::Steady);
        assert_relative_eq!(eval.value.finite().unwrap(), 2.302_585, epsilon = 1e-5);
    }

    #[test]
    fn unwrap_scenario() {
        let eval = evaluate_raw(0.5, 0.5, 10.0, 0.1, 0.3, 0.7, 1.0).unwrap();
        assert_eq!(eval.regime, Regime::Unwrap);
        assert_relative_eq!(eval.value.finite().unwrap(), 3.070_113, epsilon = 1e-5);
    }

    #[test]
    fn wrap_with_low_product_is_invalid() {
        let eval = evaluate_raw(1.0, 1.0, 10.0, 0.9, 0.3, 0.7, 1.0).unwrap();
        assert_eq!(eval.regime, Regime::Wrap);
        assert!(eval.value.is_invalid());
        assert_eq!(eval.value_or_infinity(), f64::INFINITY);
    }

    #[test]
    fn invalid_thresholds_surface() {
        let err = evaluate_raw(2.0, 0.8, 10.0, 0.5, 0.7, 0.3, 1.0).unwrap_err();
        assert!(matches!(err, MobiusError::InvalidThresholds { .. }));
    }

    fn expected_value(regime: Regime, k: f64, p: f64, u: f64) -> TimeValue {
        match regime {
            Regime::Wrap => wrap_time(1.0, k, p, u),
            Regime::Steady => TimeValue::Finite(steady_time(1.0, u)),
            Regime::Unwrap => TimeValue::Finite(unwrap_time(1.0, k, p, u)),
        }
    }

    proptest! {
        #[test]
        fn regime_matches_selector_and_formula(
            k in 0.01f64..6.0,
            p in 0.01f64..3.0,
            u in 0.0f64..200.0,
            theta in -0.5f64..1.5,
        ) {
            let eval = evaluate_raw(k, p, u, theta, 0.3, 0.7, 1.0).unwrap();
            prop_assert_eq!(eval.regime, select(theta, 0.3, 0.7).unwrap());
            prop_assert_eq!(eval.value, expected_value(eval.regime, k, p, u));
        }

        #[test]
        fn steady_ignores_k_and_p(k in 0.01f64..6.0, p in 0.01f64..3.0, u in 1.0f64..200.0) {
            let reference = evaluate_raw(1.0, 1.0, u, 0.5, 0.3, 0.7, 1.0).unwrap();
            let eval = evaluate_raw(k, p, u, 0.5, 0.3, 0.7, 1.0).unwrap();
            prop_assert_eq!(eval.value, reference.value);
        }

        #[test]
        fn wrap_low_product_never_finite(k in 0.01f64..1.0, p in 0.01f64..1.0, u in 0.0f64..200.0) {
            let eval = evaluate_raw(k, p, u, 0.95, 0.3, 0.7, 1.0).unwrap();
            prop_assert!(eval.value.is_invalid());
        }
    }
}
