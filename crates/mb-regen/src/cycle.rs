//! One detect → quarantine → improve → reinvest cycle.

use mb_core::{evaluate, Evaluation};
use mb_optimizer::{optimize, Objective, OptimizeRequest, OptimizeResult};
use mb_types::{MobiusResult, ParamBounds, ParamTriple, Regime, Thresholds};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::detect::{detect, AnomalyLimits, Detection, HealthMetrics, Severity};
use crate::policy::{quarantine_plan, reinvest_policy, QuarantinePlan, ReinvestAllocation};

/// Settings shared by every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenContext {
    pub thresholds: Thresholds,
    pub base_cost: f64,
    pub bounds: ParamBounds,
    pub limits: AnomalyLimits,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl RegenContext {
    /// Context with default limits; the resilience limit follows the lower
    /// arbiter threshold.
    pub fn new(thresholds: Thresholds) -> Self {
        let limits = AnomalyLimits {
            min_theta: thresholds.low(),
            ..AnomalyLimits::default()
        };
        Self {
            thresholds,
            base_cost: 1.0,
            bounds: ParamBounds::default(),
            limits,
            max_iterations: mb_optimizer::DEFAULT_MAX_ITERATIONS,
            tolerance: mb_optimizer::DEFAULT_TOLERANCE,
        }
    }

    pub fn with_base_cost(mut self, base_cost: f64) -> Self {
        self.base_cost = base_cost;
        self
    }

    pub fn with_bounds(mut self, bounds: ParamBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_limits(mut self, limits: AnomalyLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Outcome of the improve step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    /// Whether the optimizer was invoked.
    pub ran: bool,
    pub params: ParamTriple,
    pub result: Option<OptimizeResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenReport {
    pub detection: Detection,
    pub quarantine: QuarantinePlan,
    pub improvement: Improvement,
    pub reinvest: ReinvestAllocation,
    pub final_params: ParamTriple,
    pub final_evaluation: Evaluation,
}

/// Repair `params` by searching toward the Steady regime at `theta`.
pub fn improve(params: ParamTriple, theta: f64, ctx: &RegenContext) -> MobiusResult<OptimizeResult> {
    let request = OptimizeRequest::new(params, theta, Objective::state(Regime::Steady), ctx.thresholds)
        .with_base_cost(ctx.base_cost)
        .with_bounds(ctx.bounds)
        .with_max_iterations(ctx.max_iterations)
        .with_tolerance(ctx.tolerance);
    optimize(&request)
}

/// Run one full cycle for `params` under `metrics`.
///
/// The optimizer runs when any anomaly was detected or when the arbiter is
/// not in Steady; otherwise the parameters pass through unchanged.
pub fn regen_cycle(
    params: ParamTriple,
    metrics: &HealthMetrics,
    ctx: &RegenContext,
) -> MobiusResult<RegenReport> {
    let detection = detect(metrics, &ctx.limits);
    let quarantine = quarantine_plan(detection.severity);
    let regime_now = ctx.thresholds.classify(metrics.theta);

    let improvement = if detection.severity > Severity::None || regime_now != Regime::Steady {
        info!(
            severity = ?detection.severity,
            regime = %regime_now,
            "regen: repairing parameters"
        );
        let result = improve(params, metrics.theta, ctx)?;
        Improvement {
            ran: true,
            params: result.params,
            result: Some(result),
        }
    } else {
        debug!("regen: healthy and steady, parameters unchanged");
        Improvement {
            ran: false,
            params,
            result: None,
        }
    };

    let final_params = improvement.params;
    let final_evaluation = evaluate(&final_params, metrics.theta, &ctx.thresholds, ctx.base_cost);

    Ok(RegenReport {
        detection,
        quarantine,
        improvement,
        reinvest: reinvest_policy(),
        final_params,
        final_evaluation,
    })
}
