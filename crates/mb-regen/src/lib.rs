//! Regeneration policy layer for Mobius.
//!
//! Provides:
//! - Anomaly detection over health metrics with static limits
//! - Quarantine plans keyed by severity
//! - Parameter repair by driving the optimizer toward the Steady regime
//! - A fixed reinvestment allocation
//! - A monitor that runs full cycles and emits alerts via a channel

pub mod cycle;
pub mod detect;
pub mod monitor;
pub mod policy;

pub use cycle::{improve, regen_cycle, Improvement, RegenContext, RegenReport};
pub use detect::{detect, AnomalyLimits, AnomalyReason, Detection, HealthMetrics, Severity};
pub use monitor::{RegenAlert, RegenMonitor};
pub use policy::{quarantine_plan, reinvest_policy, QuarantineAction, QuarantinePlan, ReinvestAllocation};
