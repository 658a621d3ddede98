//! Regime arbiter.

use mb_types::{MobiusResult, Regime, Thresholds};

/// Decide the regime for resilience `theta`.
///
/// The threshold pair is validated on every call, before any comparison:
/// `low >= high` (or a non-finite bound) fails with `InvalidThresholds`.
/// `theta == high` selects Wrap and `theta == low` selects Steady.
pub fn select(theta: f64, low: f64, high: f64) -> MobiusResult<Regime> {
    let thresholds = Thresholds::new(low, high)?;
    Ok(thresholds.classify(theta))
}
