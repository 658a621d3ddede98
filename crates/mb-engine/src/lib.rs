//! Mobius engine
//!
//! Everything above the core control law: per-regime trajectories, the
//! balance controller, seeded entropy probes, the orchestrator, and the
//! configuration, logging and request handling used by `mobius-cli` and
//! `mobius-service`.

pub mod api;
pub mod balance;
pub mod config;
pub mod dynamics;
pub mod engine;
pub mod entropy;
pub mod logging;
pub mod service;

pub use balance::{BalanceController, BalanceReport, BalanceStep};
pub use config::EngineConfig;
pub use dynamics::{steady_trajectory, trajectory, unwrap_trajectory, wrap_trajectory, Trajectory};
pub use engine::{run_engine, EngineReport, DEFAULT_ENGINE_ITERS, MAX_ENGINE_ITERS};
pub use entropy::{entropy_probe, EntropyConfig, EntropyReport, MAX_ENTROPY_TRIALS};
pub use service::{router, MAX_REQUEST_BYTES};
