//! Quarantine and reinvestment policies.

use serde::{Deserialize, Serialize};

use crate::detect::Severity;

/// Recommended isolation step. Recommendations only; nothing is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineAction {
    /// Shift 20% of traffic away from the affected pool.
    #[serde(rename = "route_away_20_percent")]
    RouteAway20Percent,
    FreezeNewDeploys,
    DisableSuspectFeature,
    /// Scale out on healthy nodes.
    ScaleSafePoolUp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantinePlan {
    pub active: bool,
    pub actions: Vec<QuarantineAction>,
}

/// Isolation plan for `severity`. Higher severities extend the lower ones.
pub fn quarantine_plan(severity: Severity) -> QuarantinePlan {
    let mut actions = Vec::new();
    if severity >= Severity::Medium {
        actions.push(QuarantineAction::RouteAway20Percent);
        actions.push(QuarantineAction::FreezeNewDeploys);
    }
    if severity >= Severity::High {
        actions.push(QuarantineAction::DisableSuspectFeature);
        actions.push(QuarantineAction::ScaleSafePoolUp);
    }
    QuarantinePlan {
        active: !actions.is_empty(),
        actions,
    }
}

/// Share of recovered budget per investment area. Sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReinvestAllocation {
    /// Better logs and metrics, lowering the base cost.
    pub observability: f64,
    /// Lower recovery time.
    pub redundancy: f64,
    /// Raising `k * P`.
    pub optimization: f64,
}

impl ReinvestAllocation {
    pub fn total(&self) -> f64 {
        self.observability + self.redundancy + self.optimization
    }
}

pub fn reinvest_policy() -> ReinvestAllocation {
    ReinvestAllocation {
        observability: 0.40,
        redundancy: 0.30,
        optimization: 0.30,
    }
}
