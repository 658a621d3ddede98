//! Health metrics and anomaly detection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally observed health of the controlled system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// Fraction of failed requests, 0..1.
    pub error_rate: f64,
    /// 95th percentile latency in milliseconds.
    pub latency_p95_ms: f64,
    /// Resource utilization, 0..1.
    pub utilization: f64,
    /// Model/data drift, 0..1.
    pub drift: f64,
    /// Current resilience.
    pub theta: f64,
}

/// Static limits above which (or, for resilience, below which) a metric is
/// anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyLimits {
    pub max_error_rate: f64,
    pub max_latency_p95_ms: f64,
    pub max_utilization: f64,
    pub max_drift: f64,
    pub min_theta: f64,
}

impl Default for AnomalyLimits {
    fn default() -> Self {
        Self {
            max_error_rate: 0.05,      // 5% errors
            max_latency_p95_ms: 1500.0, // p95 > 1.5s
            max_utilization: 0.90,
            max_drift: 0.30,
            min_theta: 0.30,
        }
    }
}

/// A single breached limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum AnomalyReason {
    ErrorRate { value: f64, limit: f64 },
    LatencyP95 { value: f64, limit: f64 },
    Utilization { value: f64, limit: f64 },
    Drift { value: f64, limit: f64 },
    LowResilience { value: f64, limit: f64 },
}

impl fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorRate { limit, .. } => write!(f, "error_rate>{limit}"),
            Self::LatencyP95 { limit, .. } => write!(f, "latency_p95_ms>{limit}"),
            Self::Utilization { limit, .. } => write!(f, "utilization>{limit}"),
            Self::Drift { limit, .. } => write!(f, "drift>{limit}"),
            Self::LowResilience { limit, .. } => write!(f, "theta<{limit}"),
        }
    }
}

/// How many limits were breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing breached.
    None,
    /// Exactly one limit breached.
    Medium,
    /// Two or more limits breached.
    High,
}

impl Severity {
    fn from_breaches(count: usize) -> Self {
        match count {
            0 => Self::None,
            1 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Numeric level (0, 1, 2).
    pub fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub anomalies: bool,
    pub reasons: Vec<AnomalyReason>,
    pub severity: Severity,
}

/// Compare `metrics` against `limits`. Reasons are listed in a fixed order:
/// error rate, latency, utilization, drift, resilience.
pub fn detect(metrics: &HealthMetrics, limits: &AnomalyLimits) -> Detection {
    let mut reasons = Vec::new();

    if metrics.error_rate > limits.max_error_rate {
        reasons.push(AnomalyReason::ErrorRate {
            value: metrics.error_rate,
            limit: limits.max_error_rate,
        });
    }
    if metrics.latency_p95_ms > limits.max_latency_p95_ms {
        reasons.push(AnomalyReason::LatencyP95 {
            value: metrics.latency_p95_ms,
            limit: limits.max_latency_p95_ms,
        });
    }
    if metrics.utilization > limits.max_utilization {
        reasons.push(AnomalyReason::Utilization {
            value: metrics.utilization,
            limit: limits.max_utilization,
        });
    }
    if metrics.drift > limits.max_drift {
        reasons.push(AnomalyReason::Drift {
            value: metrics.drift,
            limit: limits.max_drift,
        });
    }
    if metrics.theta < limits.min_theta {
        reasons.push(AnomalyReason::LowResilience {
            value: metrics.theta,
            limit: limits.min_theta,
        });
    }

    Detection {
        anomalies: !reasons.is_empty(),
        severity: Severity::from_breaches(reasons.len()),
        reasons,
    }
}
