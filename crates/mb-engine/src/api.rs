//! Request handlers shared by the CLI and the HTTP service.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use mb_core::evaluate;
use mb_optimizer::{optimize as run_search, Objective, ObjectiveMode, OptimizeRequest};
use mb_regen::HealthMetrics;
use mb_types::{validation_error, MobiusError, MobiusResult, ParamBounds, ParamTriple, Regime, Thresholds};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::engine::{run_engine, EngineReport, DEFAULT_ENGINE_ITERS};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Mobius(#[from] MobiusError),

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("no route for {method} {path}")]
    NotFound { method: String, path: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Mobius(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Mobius(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

fn default_k() -> f64 {
    1.0
}

fn default_p() -> f64 {
    1.0
}

fn default_u() -> f64 {
    5.0
}

fn default_iters() -> usize {
    DEFAULT_ENGINE_ITERS
}

/// Thresholds and base cost fall back to the engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRequest {
    pub k: f64,
    #[serde(rename = "P", alias = "p")]
    pub p: f64,
    #[serde(rename = "U", alias = "u")]
    pub u: f64,
    pub theta: f64,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub base_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub params: ParamTriple,
    pub theta: f64,
    /// `None` for an Invalid Wrap value.
    pub value: Option<f64>,
    pub state: i8,
    pub state_desc: String,
    pub regime: Regime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeBody {
    #[serde(default = "default_k")]
    pub k: f64,
    #[serde(rename = "P", alias = "p", default = "default_p")]
    pub p: f64,
    #[serde(rename = "U", alias = "u", default = "default_u")]
    pub u: f64,
    pub theta: f64,
    pub mode: ObjectiveMode,
    #[serde(default)]
    pub target: Option<f64>,
    /// Signed regime: 1 Wrap, 0 Steady, -1 Unwrap.
    #[serde(default)]
    pub desired_state: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub params_opt: ParamTriple,
    pub final_value: Option<f64>,
    pub final_state: i8,
    pub final_regime: Regime,
    pub loss: f64,
    pub iters: usize,
    pub converged: bool,
    pub theta: f64,
    pub mode: ObjectiveMode,
    pub target: Option<f64>,
    pub desired_state: Option<i8>,
    pub bounds: ParamBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineBody {
    #[serde(default = "default_k")]
    pub k: f64,
    #[serde(rename = "P", alias = "p", default = "default_p")]
    pub p: f64,
    #[serde(rename = "U", alias = "u", default = "default_u")]
    pub u: f64,
    pub theta: f64,
    #[serde(default)]
    pub metrics: Option<HealthMetrics>,
    #[serde(default = "default_iters")]
    pub iters: usize,
}

pub fn step(request: &StepRequest, config: &EngineConfig) -> MobiusResult<StepResponse> {
    let params = ParamTriple::new(request.k, request.p, request.u);
    if !params.is_finite() || !request.theta.is_finite() {
        return Err(validation_error!("step inputs must be finite"));
    }

    let thresholds = match (request.low, request.high) {
        (None, None) => config.thresholds,
        (low, high) => Thresholds::new(
            low.unwrap_or(config.thresholds.low()),
            high.unwrap_or(config.thresholds.high()),
        )?,
    };
    let base_cost = request.base_cost.unwrap_or(config.base_cost);

    let eval = evaluate(&params, request.theta, &thresholds, base_cost);
    Ok(StepResponse {
        params,
        theta: request.theta,
        value: eval.value.finite(),
        state: eval.regime.sign(),
        state_desc: eval.regime.label().to_string(),
        regime: eval.regime,
    })
}

pub fn optimize(body: &OptimizeBody, config: &EngineConfig) -> MobiusResult<OptimizeResponse> {
    let desired = body
        .desired_state
        .map(|sign| {
            Regime::from_sign(sign)
                .ok_or_else(|| validation_error!("desired_state must be -1, 0 or 1, got {sign}"))
        })
        .transpose()?;

    let objective = Objective::new(body.mode, body.target, desired);
    let request = OptimizeRequest::new(
        ParamTriple::new(body.k, body.p, body.u),
        body.theta,
        objective,
        config.thresholds,
    )
    .with_base_cost(config.base_cost)
    .with_bounds(config.bounds)
    .with_max_iterations(config.max_iterations)
    .with_tolerance(config.tolerance);

    let result = run_search(&request)?;
    Ok(OptimizeResponse {
        params_opt: result.params,
        final_value: result.value.finite(),
        final_state: result.regime.sign(),
        final_regime: result.regime,
        loss: result.score,
        iters: result.iterations,
        converged: result.converged,
        theta: body.theta,
        mode: body.mode,
        target: body.target,
        desired_state: desired.map(Regime::sign),
        bounds: config.bounds,
    })
}

pub fn engine(body: &EngineBody, config: &EngineConfig) -> MobiusResult<EngineReport> {
    run_engine(
        ParamTriple::new(body.k, body.p, body.u),
        body.theta,
        body.metrics.as_ref(),
        body.iters,
        config,
    )
}
