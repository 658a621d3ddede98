//! Per-regime trajectories: simple update rules iterated from θ.

use mb_types::{ParamTriple, Regime};
use serde::{Deserialize, Serialize};

/// Iterated value of one regime's update rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub regime: Regime,
    pub final_value: f64,
    pub params: ParamTriple,
    pub iters: usize,
    /// Value after each step.
    pub history: Vec<f64>,
}

/// Compression: the value shrinks with P and U and never goes negative.
pub fn wrap_trajectory(params: &ParamTriple, theta: f64, iters: usize) -> Trajectory {
    let ParamTriple { k, p, u } = *params;
    iterate(Regime::Wrap, params, theta, iters, |v| {
        (v * (1.0 - 0.01 * p) - 0.001 * u + 0.0005 * k).max(0.0)
    })
}

/// Homeostasis: small corrections pulling the value toward U.
pub fn steady_trajectory(params: &ParamTriple, theta: f64, iters: usize) -> Trajectory {
    let ParamTriple { k, p, u } = *params;
    iterate(Regime::Steady, params, theta, iters, |v| {
        v + 0.01 * (p - k) - 0.001 * (v - u)
    })
}

/// Expansion: the value grows geometrically with P.
pub fn unwrap_trajectory(params: &ParamTriple, theta: f64, iters: usize) -> Trajectory {
    let ParamTriple { k, p, u } = *params;
    iterate(Regime::Unwrap, params, theta, iters, |v| {
        v * (1.0 + 0.01 * p) + 0.001 * u - 0.0005 * k
    })
}

pub fn trajectory(regime: Regime, params: &ParamTriple, theta: f64, iters: usize) -> Trajectory {
    match regime {
        Regime::Wrap => wrap_trajectory(params, theta, iters),
        Regime::Steady => steady_trajectory(params, theta, iters),
        Regime::Unwrap => unwrap_trajectory(params, theta, iters),
    }
}

fn iterate(
    regime: Regime,
    params: &ParamTriple,
    theta: f64,
    iters: usize,
    rule: impl Fn(f64) -> f64,
) -> Trajectory {
    let mut value = theta;
    let mut history = Vec::with_capacity(iters);
    for _ in 0..iters {
        value = rule(value);
        history.push(value);
    }
    Trajectory {
        regime,
        final_value: value,
        params: *params,
        iters,
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wrap_is_floored_at_zero() {
        let t = wrap_trajectory(&ParamTriple::new(2.0, 0.8, 100.0), 0.9, 50);
        assert_eq!(t.regime, Regime::Wrap);
        assert_eq!(t.final_value, 0.0);
        assert!(t.history.iter().all(|&v| v >= 0.0));
        assert_eq!(t.history.len(), 50);
    }

    #[test]
    fn steady_has_fixed_point() {
        // P == k and U == θ: every correction is zero
        let t = steady_trajectory(&ParamTriple::new(1.0, 1.0, 0.5), 0.5, 100);
        assert_relative_eq!(t.final_value, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn unwrap_grows() {
        let t = unwrap_trajectory(&ParamTriple::new(0.5, 0.8, 10.0), 0.1, 50);
        assert!(t.final_value > 0.1);
        assert!(t.history.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn zero_iterations_return_theta() {
        let t = trajectory(Regime::Unwrap, &ParamTriple::new(1.0, 1.0, 5.0), 0.2, 0);
        assert_eq!(t.final_value, 0.2);
        assert!(t.history.is_empty());
    }

    #[test]
    fn dispatch_matches_regime() {
        let params = ParamTriple::new(1.0, 1.0, 5.0);
        for regime in Regime::ALL {
            assert_eq!(trajectory(regime, &params, 0.5, 10).regime, regime);
        }
    }
}
