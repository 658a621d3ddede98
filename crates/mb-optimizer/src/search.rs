//! Coordinate search with geometric step decay.

use mb_core::{evaluate, Evaluation, TimeValue};
use mb_types::{Axis, MobiusResult, ParamTriple, Regime};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::request::OptimizeRequest;

/// Final snapshot of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub params: ParamTriple,
    pub value: TimeValue,
    pub regime: Regime,
    /// Objective score at `params`.
    pub score: f64,
    pub iterations: usize,
    /// `true` when the run stopped because every step fell below the
    /// tolerance, `false` when it ran out of iterations.
    pub converged: bool,
    /// Per-axis step sizes (k, P, U) at exit.
    pub final_steps: [f64; 3],
    /// Best score after each iteration.
    pub score_history: Vec<f64>,
}

/// Mutable trajectory of one run. Lives only inside [`CoordinateSearch::run`].
#[derive(Debug, Clone)]
struct SearchState {
    best: ParamTriple,
    best_score: f64,
    best_eval: Evaluation,
    steps: [f64; 3],
    iterations: usize,
    converged: bool,
    history: Vec<f64>,
}

/// Deterministic local search over the (k, P, U) box.
///
/// Each iteration visits the axes in the order k, P, U and tries `+step`
/// then `-step` from the current best point. Improving candidates are taken
/// immediately. An iteration without any improvement scales every step by
/// the decay factor; the run converges once every step is below tolerance.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateSearch<'a> {
    request: &'a OptimizeRequest,
}

impl<'a> CoordinateSearch<'a> {
    pub fn new(request: &'a OptimizeRequest) -> MobiusResult<Self> {
        request.validate()?;
        Ok(Self { request })
    }

    pub fn run(&self) -> OptimizeResult {
        let mut state = self.start();
        debug!(
            start = %state.best,
            score = state.best_score,
            theta = self.request.theta,
            mode = %self.request.objective.mode,
            "starting coordinate search"
        );

        while state.iterations < self.request.max_iterations {
            state.iterations += 1;
            let improved = self.sweep(&mut state);

            if !improved {
                for step in state.steps.iter_mut() {
                    *step *= self.request.step_decay;
                }
                if state.steps.iter().all(|&s| s < self.request.tolerance) {
                    state.converged = true;
                }
            }

            state.history.push(state.best_score);
            trace!(
                iteration = state.iterations,
                score = state.best_score,
                best = %state.best,
                improved,
                "search iteration"
            );

            if state.converged {
                break;
            }
        }

        debug!(
            best = %state.best,
            score = state.best_score,
            regime = %state.best_eval.regime,
            iterations = state.iterations,
            converged = state.converged,
            "coordinate search finished"
        );

        OptimizeResult {
            params: state.best,
            value: state.best_eval.value,
            regime: state.best_eval.regime,
            score: state.best_score,
            iterations: state.iterations,
            converged: state.converged,
            final_steps: state.steps,
            score_history: state.history,
        }
    }

    fn start(&self) -> SearchState {
        let request = self.request;
        let best = request.bounds.clamp(request.initial_guess);
        let (best_score, best_eval) = self.score(&best);

        let mut steps = [0.0; 3];
        for axis in Axis::ALL {
            steps[axis.index()] = request.initial_step_fraction * request.bounds.axis(axis).span();
        }

        SearchState {
            best,
            best_score,
            best_eval,
            steps,
            iterations: 0,
            converged: false,
            history: Vec::with_capacity(request.max_iterations.min(4096)),
        }
    }

    /// One pass over all axes. Returns whether any candidate was accepted.
    fn sweep(&self, state: &mut SearchState) -> bool {
        let mut improved = false;

        for axis in Axis::ALL {
            let bounds = self.request.bounds.axis(axis);
            let step = state.steps[axis.index()];

            for direction in [1.0, -1.0] {
                let moved = bounds.clamp(state.best.get(axis) + direction * step);
                let candidate = state.best.with(axis, moved);
                let (score, eval) = self.score(&candidate);

                if score + self.request.improvement_slack < state.best_score {
                    state.best = candidate;
                    state.best_score = score;
                    state.best_eval = eval;
                    improved = true;
                }
            }
        }

        improved
    }

    fn score(&self, params: &ParamTriple) -> (f64, Evaluation) {
        let request = self.request;
        let eval = evaluate(params, request.theta, &request.thresholds, request.base_cost);
        (request.objective.score(&eval, params), eval)
    }
}

/// Run the coordinate search described by `request`.
///
/// Fails with `InvalidConfiguration` before any evaluation if the request
/// is inconsistent.
pub fn optimize(request: &OptimizeRequest) -> MobiusResult<OptimizeResult> {
    Ok(CoordinateSearch::new(request)?.run())
}
