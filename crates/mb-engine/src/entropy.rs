//! Seeded perturbation probes.

use mb_core::{evaluate, TimeValue};
use mb_types::{invalid_configuration, MobiusResult, ParamTriple, Regime, Thresholds};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAX_ENTROPY_TRIALS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropyConfig {
    pub trials: usize,
    /// Half-width of the uniform multiplicative noise, in [0, 1).
    pub perturb: f64,
    pub seed: u64,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            trials: 20,
            perturb: 0.15,
            seed: 42,
        }
    }
}

impl EntropyConfig {
    pub fn validate(&self) -> MobiusResult<()> {
        if self.trials == 0 || self.trials > MAX_ENTROPY_TRIALS {
            return Err(invalid_configuration!(
                "entropy trials must be in 1..={MAX_ENTROPY_TRIALS}, got {}",
                self.trials
            ));
        }
        if !(self.perturb >= 0.0 && self.perturb < 1.0) {
            return Err(invalid_configuration!(
                "entropy perturbation must be in [0, 1), got {}",
                self.perturb
            ));
        }
        Ok(())
    }
}

/// Summary over every trial. Statistics cover finite values only; Invalid
/// Wrap values are counted in `invalid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyReport {
    pub trials: usize,
    pub perturb: f64,
    pub seed: u64,
    pub invalid: usize,
    pub avg_value: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Regimes seen, ordered by sign (Unwrap, Steady, Wrap).
    pub distinct_regimes: Vec<Regime>,
}

/// Evaluate `config.trials` independently perturbed copies of `params`.
pub fn entropy_probe(
    params: &ParamTriple,
    theta: f64,
    thresholds: &Thresholds,
    base_cost: f64,
    config: &EntropyConfig,
) -> MobiusResult<EntropyReport> {
    config.validate()?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let spread = config.perturb;
    let mut values = Vec::with_capacity(config.trials);
    let mut invalid = 0;
    let mut regimes: Vec<Regime> = Vec::new();

    for _ in 0..config.trials {
        let perturbed = ParamTriple::new(
            params.k * (1.0 + rng.gen_range(-spread..=spread)),
            params.p * (1.0 + rng.gen_range(-spread..=spread)),
            params.u * (1.0 + rng.gen_range(-spread..=spread)),
        );
        let eval = evaluate(&perturbed, theta, thresholds, base_cost);
        match eval.value {
            TimeValue::Finite(v) => values.push(v),
            TimeValue::Invalid => invalid += 1,
        }
        if !regimes.contains(&eval.regime) {
            regimes.push(eval.regime);
        }
    }
    regimes.sort_by_key(|r| r.sign());

    let (avg_value, min_value, max_value) = if values.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = values.iter().sum();
        (
            Some(sum / values.len() as f64),
            values.iter().copied().reduce(f64::min),
            values.iter().copied().reduce(f64::max),
        )
    };

    debug!(trials = config.trials, invalid, ?avg_value, "entropy probe finished");

    Ok(EntropyReport {
        trials: config.trials,
        perturb: config.perturb,
        seed: config.seed,
        invalid,
        avg_value,
        min_value,
        max_value,
        distinct_regimes: regimes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds::new(0.3, 0.7).unwrap()
    }

    #[test]
    fn statistics_are_ordered() {
        let config = EntropyConfig {
            trials: 20,
            perturb: 0.2,
            seed: 7,
        };
        let report =
            entropy_probe(&ParamTriple::new(1.0, 1.0, 5.0), 0.5, &thresholds(), 1.0, &config)
                .unwrap();
        let (min, avg, max) = (
            report.min_value.unwrap(),
            report.avg_value.unwrap(),
            report.max_value.unwrap(),
        );
        assert!(min <= avg && avg <= max);
        assert_eq!(report.trials, 20);
        assert_eq!(report.invalid, 0);
        assert_eq!(report.distinct_regimes, vec![Regime::Steady]);
    }

    #[test]
    fn same_seed_same_report() {
        let params = ParamTriple::new(2.0, 0.8, 10.0);
        let config = EntropyConfig::default();
        let a = entropy_probe(&params, 0.9, &thresholds(), 1.0, &config).unwrap();
        let b = entropy_probe(&params, 0.9, &thresholds(), 1.0, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_perturbation_is_constant() {
        let config = EntropyConfig {
            perturb: 0.0,
            ..EntropyConfig::default()
        };
        let report =
            entropy_probe(&ParamTriple::new(1.0, 1.0, 5.0), 0.5, &thresholds(), 1.0, &config)
                .unwrap();
        assert_eq!(report.min_value, report.max_value);
    }

    #[test]
    fn invalid_wrap_values_are_counted_not_averaged() {
        // k * P = 1; roughly half of the perturbed products fall below 1
        let config = EntropyConfig {
            trials: 200,
            perturb: 0.05,
            seed: 1,
        };
        let report =
            entropy_probe(&ParamTriple::new(1.0, 1.0, 10.0), 0.9, &thresholds(), 1.0, &config)
                .unwrap();
        assert!(report.invalid > 0);
        assert!(report.invalid < 200);
        assert!(report.avg_value.unwrap().is_finite());
    }

    #[test]
    fn all_invalid_has_no_statistics() {
        let config = EntropyConfig {
            trials: 10,
            perturb: 0.1,
            seed: 3,
        };
        let report =
            entropy_probe(&ParamTriple::new(0.5, 0.5, 10.0), 0.9, &thresholds(), 1.0, &config)
                .unwrap();
        assert_eq!(report.invalid, 10);
        assert!(report.avg_value.is_none());
    }

    #[test]
    fn rejects_bad_config() {
        let params = ParamTriple::new(1.0, 1.0, 5.0);
        let zero = EntropyConfig {
            trials: 0,
            ..EntropyConfig::default()
        };
        assert!(entropy_probe(&params, 0.5, &thresholds(), 1.0, &zero).is_err());
        let wide = EntropyConfig {
            perturb: 1.0,
            ..EntropyConfig::default()
        };
        assert!(entropy_probe(&params, 0.5, &thresholds(), 1.0, &wide).is_err());
        let huge = EntropyConfig {
            trials: usize::MAX,
            ..EntropyConfig::default()
        };
        assert!(entropy_probe(&params, 0.5, &thresholds(), 1.0, &huge).is_err());
    }
}
