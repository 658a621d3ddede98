//! Proportional controller nudging (k, P, U) toward a target time value.

use mb_core::{evaluate, TimeValue};
use mb_types::{invalid_configuration, MobiusResult, ParamTriple, Regime, Thresholds};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BALANCE_ITERS: usize = 200;
pub const DEFAULT_LEARNING_RATE: f64 = 0.05;

/// Smallest `k` the controller will set.
const MIN_K: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceStep {
    pub params: ParamTriple,
    pub value: TimeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Parameters with the smallest observed loss.
    pub params: ParamTriple,
    pub value: TimeValue,
    /// Regime of the last evaluated step.
    pub regime: Regime,
    /// `|value - target|` at `params`; infinite if no step produced a
    /// finite value.
    pub loss: f64,
    pub history: Vec<BalanceStep>,
}

/// Unbounded multiplicative controller.
///
/// Below the target U grows by `1 + lr` and P by `1 + lr/2`; above it both
/// shrink by the same factors. `k` follows the signed error and never drops
/// below 0.1. An Invalid Wrap value raises k and P until `k * P > 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceController {
    pub thresholds: Thresholds,
    pub base_cost: f64,
    pub iters: usize,
    pub learning_rate: f64,
}

impl BalanceController {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            base_cost: 1.0,
            iters: DEFAULT_BALANCE_ITERS,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }

    pub fn with_base_cost(mut self, base_cost: f64) -> Self {
        self.base_cost = base_cost;
        self
    }

    pub fn with_iters(mut self, iters: usize) -> Self {
        self.iters = iters;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn run(&self, start: ParamTriple, theta: f64, target: f64) -> MobiusResult<BalanceReport> {
        if !target.is_finite() {
            return Err(invalid_configuration!("balance target must be finite, got {target}"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate < 1.0) {
            return Err(invalid_configuration!(
                "learning rate must be in (0, 1), got {}",
                self.learning_rate
            ));
        }
        if !start.is_finite() {
            return Err(invalid_configuration!("balance start {start} is not finite"));
        }

        let lr = self.learning_rate;
        let first = evaluate(&start, theta, &self.thresholds, self.base_cost);
        let mut best = start;
        let mut best_value = first.value;
        let mut best_loss = loss(first.value, target);
        let mut regime = first.regime;

        let mut current = start;
        let mut history = Vec::with_capacity(self.iters);

        for _ in 0..self.iters {
            let eval = evaluate(&current, theta, &self.thresholds, self.base_cost);
            history.push(BalanceStep {
                params: current,
                value: eval.value,
            });
            regime = eval.regime;

            let step_loss = loss(eval.value, target);
            if step_loss < best_loss {
                best_loss = step_loss;
                best_value = eval.value;
                best = current;
            }

            current = match eval.value {
                TimeValue::Finite(v) => {
                    let (u_scale, p_scale) = if v < target {
                        (1.0 + lr, 1.0 + lr / 2.0)
                    } else {
                        (1.0 - lr, 1.0 - lr / 2.0)
                    };
                    ParamTriple::new(
                        (current.k * (1.0 + 0.01 * (target - v))).max(MIN_K),
                        current.p * p_scale,
                        current.u * u_scale,
                    )
                }
                TimeValue::Invalid => ParamTriple::new(
                    current.k * (1.0 + lr),
                    current.p * (1.0 + lr / 2.0),
                    current.u,
                ),
            };
        }

        debug!(best = %best, loss = best_loss, target, "balance finished");

        Ok(BalanceReport {
            params: best,
            value: best_value,
            regime,
            loss: best_loss,
            history,
        })
    }
}

fn loss(value: TimeValue, target: f64) -> f64 {
    match value {
        TimeValue::Finite(v) => (v - target).abs(),
        TimeValue::Invalid => f64::INFINITY,
    }
}
