//! Engine configuration: defaults, optional JSON file, environment overrides.

use std::path::Path;

use mb_regen::RegenContext;
use mb_types::{config_error, MobiusResult, ParamBounds, Thresholds};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entropy::EntropyConfig;

pub const CONFIG_PATH_ENV: &str = "MOBIUS_CONFIG";
pub const ADDR_ENV: &str = "MOBIUS_ADDR";
pub const THETA_LOW_ENV: &str = "MOBIUS_THETA_LOW";
pub const THETA_HIGH_ENV: &str = "MOBIUS_THETA_HIGH";
pub const BASE_COST_ENV: &str = "MOBIUS_BASE_COST";

const DEFAULT_THETA_LOW: f64 = 0.3;
const DEFAULT_THETA_HIGH: f64 = 0.7;
const DEFAULT_ADDR: &str = "0.0.0.0:8081";

/// Settings shared by the handlers, the CLI and the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub base_cost: f64,
    pub bounds: ParamBounds,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub entropy: EntropyConfig,
    pub listen_addr: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::new(DEFAULT_THETA_LOW, DEFAULT_THETA_HIGH)
                .unwrap_or_else(|_| unreachable!("default thresholds are ordered")),
            base_cost: 1.0,
            bounds: ParamBounds::default(),
            max_iterations: mb_optimizer::DEFAULT_MAX_ITERATIONS,
            tolerance: mb_optimizer::DEFAULT_TOLERANCE,
            entropy: EntropyConfig::default(),
            listen_addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults, then the file named by `MOBIUS_CONFIG` if set, then the
    /// individual environment overrides.
    pub fn load() -> MobiusResult<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|key| std::env::var(key).ok())?;
        info!(
            addr = %config.listen_addr,
            low = config.thresholds.low(),
            high = config.thresholds.high(),
            base_cost = config.base_cost,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Read a JSON file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> MobiusResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| config_error!("cannot read {}: {err}", path.display()))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps an environment key to its
    /// value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> MobiusResult<Self> {
        if let Some(addr) = lookup(ADDR_ENV) {
            self.listen_addr = addr;
        }

        let low = parse_override(&lookup, THETA_LOW_ENV)?;
        let high = parse_override(&lookup, THETA_HIGH_ENV)?;
        if low.is_some() || high.is_some() {
            self.thresholds = Thresholds::new(
                low.unwrap_or(self.thresholds.low()),
                high.unwrap_or(self.thresholds.high()),
            )?;
        }

        if let Some(base_cost) = parse_override(&lookup, BASE_COST_ENV)? {
            self.base_cost = base_cost;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> MobiusResult<()> {
        if !(self.base_cost.is_finite() && self.base_cost > 0.0) {
            return Err(config_error!("base_cost must be positive and finite, got {}", self.base_cost));
        }
        if self.max_iterations == 0 {
            return Err(config_error!("max_iterations must be positive"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(config_error!("tolerance must be positive, got {}", self.tolerance));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(config_error!("listen_addr is empty"));
        }
        self.bounds.validate()?;
        self.entropy.validate()?;
        Ok(())
    }

    /// Regeneration settings derived from this configuration.
    pub fn regen_context(&self) -> RegenContext {
        let mut ctx = RegenContext::new(self.thresholds)
            .with_base_cost(self.base_cost)
            .with_bounds(self.bounds);
        ctx.max_iterations = self.max_iterations;
        ctx.tolerance = self.tolerance;
        ctx
    }
}

fn parse_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> MobiusResult<Option<f64>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| config_error!("{key} must be a number, got '{raw}'")),
    }
}
