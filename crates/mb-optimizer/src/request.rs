//! Optimizer run configuration.

use mb_types::{invalid_configuration, MobiusResult, ParamBounds, ParamTriple, Thresholds};
use serde::{Deserialize, Serialize};

use crate::objective::Objective;

pub const DEFAULT_MAX_ITERATIONS: usize = 2000;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
const DEFAULT_STEP_DECAY: f64 = 0.5;
const DEFAULT_INITIAL_STEP_FRACTION: f64 = 0.25;
const DEFAULT_IMPROVEMENT_SLACK: f64 = 1e-9;

/// Everything one optimizer run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Starting point; clamped into `bounds` before the first evaluation.
    pub initial_guess: ParamTriple,

    /// Resilience the evaluator is called with.
    pub theta: f64,

    pub objective: Objective,

    pub thresholds: Thresholds,

    /// Base cost `T1` passed to the time formulas.
    pub base_cost: f64,

    pub bounds: ParamBounds,

    /// Hard cap on search iterations.
    pub max_iterations: usize,

    /// Convergence threshold on every per-axis step size.
    pub tolerance: f64,

    /// Factor applied to every step after an iteration without improvement.
    pub step_decay: f64,

    /// Initial step per axis as a fraction of that axis' span.
    pub initial_step_fraction: f64,

    /// A candidate must beat the best score by more than this to be accepted.
    pub improvement_slack: f64,
}

impl OptimizeRequest {
    pub fn new(
        initial_guess: ParamTriple,
        theta: f64,
        objective: Objective,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            initial_guess,
            theta,
            objective,
            thresholds,
            base_cost: 1.0,
            bounds: ParamBounds::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            step_decay: DEFAULT_STEP_DECAY,
            initial_step_fraction: DEFAULT_INITIAL_STEP_FRACTION,
            improvement_slack: DEFAULT_IMPROVEMENT_SLACK,
        }
    }

    pub fn with_bounds(mut self, bounds: ParamBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_base_cost(mut self, base_cost: f64) -> Self {
        self.base_cost = base_cost;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_step_decay(mut self, decay: f64) -> Self {
        self.step_decay = decay;
        self
    }

    pub fn with_initial_step_fraction(mut self, fraction: f64) -> Self {
        self.initial_step_fraction = fraction;
        self
    }

    pub fn with_improvement_slack(mut self, slack: f64) -> Self {
        self.improvement_slack = slack;
        self
    }

    /// Check every precondition of a run. Fails with `InvalidConfiguration`.
    pub fn validate(&self) -> MobiusResult<()> {
        self.objective.validate()?;
        self.bounds.validate()?;

        if !self.initial_guess.is_finite() {
            return Err(invalid_configuration!(
                "initial guess must be finite, got {}",
                self.initial_guess
            ));
        }
        if !self.theta.is_finite() {
            return Err(invalid_configuration!("theta must be finite, got {}", self.theta));
        }
        if !self.base_cost.is_finite() {
            return Err(invalid_configuration!(
                "base cost must be finite, got {}",
                self.base_cost
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid_configuration!("max_iterations must be at least 1"));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(invalid_configuration!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            ));
        }
        if !(self.step_decay > 0.0 && self.step_decay < 1.0) {
            return Err(invalid_configuration!(
                "step decay must lie in (0, 1), got {}",
                self.step_decay
            ));
        }
        if !(self.initial_step_fraction > 0.0 && self.initial_step_fraction.is_finite()) {
            return Err(invalid_configuration!(
                "initial step fraction must be positive and finite, got {}",
                self.initial_step_fraction
            ));
        }
        if !(self.improvement_slack >= 0.0 && self.improvement_slack.is_finite()) {
            return Err(invalid_configuration!(
                "improvement slack must be non-negative and finite, got {}",
                self.improvement_slack
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveMode;
    use mb_types::{MobiusError, Regime};

    fn sample_request() -> OptimizeRequest {
        OptimizeRequest::new(
            ParamTriple::new(1.0, 1.0, 5.0),
            0.45,
            Objective::value(3.0),
            Thresholds::new(0.3, 0.7).unwrap(),
        )
    }

    fn assert_invalid(request: OptimizeRequest) {
        match request.validate() {
            Err(MobiusError::InvalidConfiguration(_)) => (),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let request = sample_request();
        assert!(request.validate().is_ok());
        assert_eq!(request.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(request.bounds, ParamBounds::default());
    }

    #[test]
    fn builder_chain() {
        let request = sample_request()
            .with_max_iterations(10)
            .with_tolerance(1e-3)
            .with_base_cost(2.0)
            .with_step_decay(0.8);
        assert_eq!(request.max_iterations, 10);
        assert_eq!(request.tolerance, 1e-3);
        assert_eq!(request.base_cost, 2.0);
        assert_eq!(request.step_decay, 0.8);
    }

    #[test]
    fn missing_mode_arguments() {
        let mut value_without_target = sample_request();
        value_without_target.objective = Objective::new(ObjectiveMode::Value, None, None);
        assert_invalid(value_without_target);

        let mut state_without_regime = sample_request();
        state_without_regime.objective = Objective::new(ObjectiveMode::State, None, None);
        assert_invalid(state_without_regime);

        let mut state = sample_request();
        state.objective = Objective::state(Regime::Steady);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn search_parameters_are_checked() {
        assert_invalid(sample_request().with_max_iterations(0));
        assert_invalid(sample_request().with_tolerance(0.0));
        assert_invalid(sample_request().with_tolerance(f64::NAN));
        assert_invalid(sample_request().with_step_decay(1.0));
        assert_invalid(sample_request().with_step_decay(0.0));
        assert_invalid(sample_request().with_initial_step_fraction(-0.25));
        assert_invalid(sample_request().with_improvement_slack(-1.0));
        assert_invalid(sample_request().with_bounds(ParamBounds::new(
            (5.0, 0.1),
            (0.1, 2.0),
            (1.0, 100.0),
        )));

        let mut nan_guess = sample_request();
        nan_guess.initial_guess = ParamTriple::new(f64::NAN, 1.0, 1.0);
        assert_invalid(nan_guess);
    }
}
