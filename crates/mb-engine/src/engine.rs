//! Orchestrator running every stage for one parameter set.

use mb_core::select;
use mb_optimizer::{optimize, Objective, OptimizeRequest, OptimizeResult};
use mb_regen::{regen_cycle, HealthMetrics, RegenReport};
use mb_types::{validation_error, MobiusResult, ParamTriple, Regime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::balance::{BalanceController, BalanceReport};
use crate::config::EngineConfig;
use crate::dynamics::{trajectory, Trajectory};
use crate::entropy::{entropy_probe, EntropyReport};

pub const DEFAULT_ENGINE_ITERS: usize = 100;

/// Upper bound on trajectory length accepted by `run_engine`.
pub const MAX_ENGINE_ITERS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    pub regime: Regime,
    /// Signed encoding of `regime`.
    pub state: i8,
    pub base: Trajectory,
    /// Present only when metrics were supplied.
    pub regen: Option<RegenReport>,
    pub balance: BalanceReport,
    pub optimize: OptimizeResult,
    pub entropy: EntropyReport,
}

/// Arbiter, regime trajectory, regeneration (with metrics), balance toward
/// the trajectory's final value, a state-mode search toward the arbiter's
/// regime and finally an entropy probe.
pub fn run_engine(
    params: ParamTriple,
    theta: f64,
    metrics: Option<&HealthMetrics>,
    iters: usize,
    config: &EngineConfig,
) -> MobiusResult<EngineReport> {
    if !theta.is_finite() {
        return Err(validation_error!("theta must be finite, got {theta}"));
    }
    if !params.is_finite() {
        return Err(validation_error!("parameters {params} are not finite"));
    }
    if iters > MAX_ENGINE_ITERS {
        return Err(validation_error!(
            "iters must be at most {MAX_ENGINE_ITERS}, got {iters}"
        ));
    }

    let thresholds = config.thresholds;
    let regime = select(theta, thresholds.low(), thresholds.high())?;
    let base = trajectory(regime, &params, theta, iters);

    let regen = metrics
        .map(|m| regen_cycle(params, m, &config.regen_context()))
        .transpose()?;

    let balance = BalanceController::new(thresholds)
        .with_base_cost(config.base_cost)
        .run(params, theta, base.final_value)?;

    let request = OptimizeRequest::new(params, theta, Objective::state(regime), thresholds)
        .with_base_cost(config.base_cost)
        .with_bounds(config.bounds)
        .with_max_iterations(config.max_iterations)
        .with_tolerance(config.tolerance);
    let optimized = optimize(&request)?;

    let entropy = entropy_probe(&params, theta, &thresholds, config.base_cost, &config.entropy)?;

    info!(
        %params,
        theta,
        %regime,
        base = base.final_value,
        regen = regen.is_some(),
        optimized = %optimized.params,
        "engine run complete"
    );

    Ok(EngineReport {
        regime,
        state: regime.sign(),
        base,
        regen,
        balance,
        optimize: optimized,
        entropy,
    })
}
