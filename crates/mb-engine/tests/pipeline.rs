use approx::assert_relative_eq;
use mb_core::evaluate;
use mb_engine::api::{self, EngineBody, StepRequest};
use mb_engine::{run_engine, EngineConfig};
use mb_regen::{HealthMetrics, Severity};
use mb_types::{ParamTriple, Regime};

fn metrics(error_rate: f64, latency: f64, utilization: f64, drift: f64, theta: f64) -> HealthMetrics {
    HealthMetrics {
        error_rate,
        latency_p95_ms: latency,
        utilization,
        drift,
        theta,
    }
}

#[test]
fn engine_follows_arbiter_on_every_path() {
    let config = EngineConfig::default();
    let cases = [
        (ParamTriple::new(2.0, 0.8, 10.0), 0.9, Regime::Wrap),
        (ParamTriple::new(1.0, 1.0, 5.0), 0.5, Regime::Steady),
        (ParamTriple::new(0.5, 0.8, 10.0), 0.1, Regime::Unwrap),
    ];

    for (params, theta, regime) in cases {
        let m = metrics(0.01, 700.0, 0.6, 0.05, theta);
        let report = run_engine(params, theta, Some(&m), 50, &config).unwrap();
        assert_eq!(report.regime, regime);
        assert_eq!(report.state, regime.sign());
        assert_eq!(report.base.regime, regime);
        assert_eq!(report.optimize.regime, regime);
        assert_eq!(report.entropy.distinct_regimes, vec![regime]);
    }
}

#[test]
fn anomalous_metrics_activate_regen() {
    let m = metrics(0.2, 2000.0, 0.95, 0.4, 0.25);
    let report = run_engine(
        ParamTriple::new(1.0, 1.0, 5.0),
        0.25,
        Some(&m),
        30,
        &EngineConfig::default(),
    )
    .unwrap();

    let regen = report.regen.expect("metrics supplied");
    assert!(regen.detection.anomalies);
    assert_eq!(regen.detection.severity, Severity::High);
    assert!(regen.improvement.ran);
    assert_eq!(regen.final_evaluation.regime, Regime::Unwrap);
}

#[test]
fn step_handler_matches_core_evaluator() {
    let config = EngineConfig::default();
    for theta in [0.1, 0.5, 0.9] {
        let request = StepRequest {
            k: 2.0,
            p: 0.8,
            u: 10.0,
            theta,
            low: None,
            high: None,
            base_cost: None,
        };
        let response = api::step(&request, &config).unwrap();
        let direct = evaluate(&response.params, theta, &config.thresholds, config.base_cost);
        assert_eq!(response.regime, direct.regime);
        assert_eq!(response.value, direct.value.finite());
    }
}

#[test]
fn engine_handler_returns_full_report() {
    let request: EngineBody = serde_json::from_str(
        r#"{"k": 1.0, "P": 1.0, "U": 5.0, "theta": 0.6,
            "metrics": {"error_rate": 0.01, "latency_p95_ms": 800.0, "utilization": 0.5, "drift": 0.1, "theta": 0.6}}"#,
    )
    .unwrap();
    let report = api::engine(&request, &EngineConfig::default()).unwrap();
    let body = serde_json::to_value(&report).unwrap();
    assert_eq!(body["state"], 0);
    assert_eq!(body["base"]["iters"], 100);
    assert!(body["regen"].is_object());
    assert!(body["balance"]["history"].is_array());
    assert_eq!(body["entropy"]["trials"], 20);
}

#[test]
fn base_cost_scales_step_values() {
    let mut config = EngineConfig::default();
    let request = StepRequest {
        k: 1.0,
        p: 1.0,
        u: 10.0,
        theta: 0.5,
        low: None,
        high: None,
        base_cost: None,
    };
    let unit = api::step(&request, &config).unwrap().value.unwrap();
    config.base_cost = 3.0;
    let scaled = api::step(&request, &config).unwrap().value.unwrap();
    assert_relative_eq!(scaled, 3.0 * unit, epsilon = 1e-12);
}
