//! Regeneration monitor: runs cycles and emits alerts on a channel.

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use mb_types::{MobiusResult, ParamTriple};

use crate::cycle::{regen_cycle, RegenContext, RegenReport};
use crate::detect::{AnomalyReason, HealthMetrics, Severity};

/// Alert emitted whenever a cycle detects anomalies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenAlert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub reasons: Vec<AnomalyReason>,
    pub message: String,
}

impl RegenAlert {
    pub fn new(severity: Severity, reasons: Vec<AnomalyReason>) -> Self {
        let names: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            message: format!("{} limit(s) breached: {}", reasons.len(), names.join(", ")),
            reasons,
        }
    }
}

/// Holds the current parameters and runs one cycle per metrics sample.
///
/// Repaired parameters replace the current ones, so consecutive samples
/// start from the last repair.
pub struct RegenMonitor {
    context: RegenContext,
    params: ParamTriple,
    alert_tx: Sender<RegenAlert>,
    last_report: Option<RegenReport>,
}

impl RegenMonitor {
    pub fn new(context: RegenContext, params: ParamTriple, alert_tx: Sender<RegenAlert>) -> Self {
        Self {
            context,
            params,
            alert_tx,
            last_report: None,
        }
    }

    pub fn params(&self) -> ParamTriple {
        self.params
    }

    pub fn context(&self) -> &RegenContext {
        &self.context
    }

    pub fn last_report(&self) -> Option<&RegenReport> {
        self.last_report.as_ref()
    }

    /// Run one cycle on `metrics`, emit an alert if anything was breached
    /// and adopt the resulting parameters.
    pub fn observe(&mut self, metrics: &HealthMetrics) -> MobiusResult<RegenReport> {
        let report = regen_cycle(self.params, metrics, &self.context)?;

        if report.detection.anomalies {
            self.emit(RegenAlert::new(
                report.detection.severity,
                report.detection.reasons.clone(),
            ));
        }

        self.params = report.final_params;
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn emit(&self, alert: RegenAlert) {
        match alert.severity {
            Severity::High => warn!(%alert.message, "REGEN HIGH"),
            Severity::Medium => warn!(%alert.message, "REGEN MEDIUM"),
            Severity::None => info!(%alert.message, "REGEN INFO"),
        }
        // receiver may be gone; alerts are best effort
        let _ = self.alert_tx.try_send(alert);
    }
}
