//! # mb-optimizer
//!
//! Parameter search for the Mobius control law.
//!
//! Provides objective definitions (hit a target value, or force a target
//! regime), request validation, and a deterministic coordinate search with
//! geometric step decay over a bounded (k, P, U) box.

mod objective;
mod request;
mod search;

pub use objective::{
    Objective, ObjectiveMode, INVALID_SCORE, REGIME_PENALTY, STATE_PENALTY,
};
pub use request::{OptimizeRequest, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
pub use search::{optimize, CoordinateSearch, OptimizeResult};
