//! # mb-core
//!
//! The decision and formula engine: the regime arbiter, one time formula per
//! regime, and the single-step evaluator that composes them.

pub mod arbiter;
pub mod formulas;
pub mod step;

pub use arbiter::select;
pub use formulas::{
    geometric_partial_sum, regime_value, safe_log_u, steady_time, unwrap_time, wrap_time,
    TimeValue, LOG_U_EPSILON, UNWRAP_TRUNCATION_TERMS,
};
pub use step::{evaluate, evaluate_raw, Evaluation};
