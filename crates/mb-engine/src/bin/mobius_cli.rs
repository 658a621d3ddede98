use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueHint};
use mb_engine::api::{self, EngineBody, OptimizeBody, StepRequest};
use mb_engine::{logging, EngineConfig, DEFAULT_ENGINE_ITERS};
use mb_optimizer::ObjectiveMode;
use mb_regen::HealthMetrics;
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about = "Mobius temporal control law")]
struct Cli {
    /// Debug-level logging on stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// JSON configuration file; otherwise MOBIUS_CONFIG or built-in defaults
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one step: regime and time value
    Step(StepArgs),

    /// Search (k, P, U) for a target value or a target regime
    Optimize(OptimizeArgs),

    /// Run the full engine pipeline
    Engine(EngineArgs),
}

#[derive(Args)]
struct StepArgs {
    #[arg(long)]
    k: f64,
    #[arg(long = "P", visible_alias = "p")]
    p: f64,
    #[arg(long = "U", visible_alias = "u")]
    u: f64,
    #[arg(long, allow_hyphen_values = true)]
    theta: f64,
    /// Override the configured lower threshold
    #[arg(long, allow_hyphen_values = true)]
    low: Option<f64>,
    /// Override the configured upper threshold
    #[arg(long, allow_hyphen_values = true)]
    high: Option<f64>,
    #[arg(long)]
    base_cost: Option<f64>,
}

#[derive(Args)]
struct OptimizeArgs {
    #[arg(long, default_value_t = 1.0)]
    k: f64,
    #[arg(long = "P", visible_alias = "p", default_value_t = 1.0)]
    p: f64,
    #[arg(long = "U", visible_alias = "u", default_value_t = 5.0)]
    u: f64,
    #[arg(long, allow_hyphen_values = true)]
    theta: f64,
    /// value or state
    #[arg(long)]
    mode: ObjectiveMode,
    #[arg(long, allow_hyphen_values = true)]
    target: Option<f64>,
    /// 1 (Wrap), 0 (Steady) or -1 (Unwrap)
    #[arg(long, allow_hyphen_values = true)]
    desired_state: Option<i64>,
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, default_value_t = 1.0)]
    k: f64,
    #[arg(long = "P", visible_alias = "p", default_value_t = 1.0)]
    p: f64,
    #[arg(long = "U", visible_alias = "u", default_value_t = 5.0)]
    u: f64,
    #[arg(long, allow_hyphen_values = true)]
    theta: f64,
    #[arg(long, default_value_t = DEFAULT_ENGINE_ITERS)]
    iters: usize,
    /// Health metrics as JSON, e.g. '{"error_rate":0.01,"latency_p95_ms":800,
    /// "utilization":0.5,"drift":0.1,"theta":0.6}'
    #[arg(long)]
    metrics: Option<String>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?.with_overrides(|key| std::env::var(key).ok())?,
        None => EngineConfig::load()?,
    };
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Step(args) => {
            let request = StepRequest {
                k: args.k,
                p: args.p,
                u: args.u,
                theta: args.theta,
                low: args.low,
                high: args.high,
                base_cost: args.base_cost,
            };
            print_json(&api::step(&request, &config)?)
        }
        Command::Optimize(args) => {
            let body = OptimizeBody {
                k: args.k,
                p: args.p,
                u: args.u,
                theta: args.theta,
                mode: args.mode,
                target: args.target,
                desired_state: args.desired_state,
            };
            print_json(&api::optimize(&body, &config)?)
        }
        Command::Engine(args) => {
            let metrics: Option<HealthMetrics> = args
                .metrics
                .as_deref()
                .map(|raw| serde_json::from_str::<HealthMetrics>(raw))
                .transpose()
                .context("--metrics is not valid health metrics JSON")?;
            let body = EngineBody {
                k: args.k,
                p: args.p,
                u: args.u,
                theta: args.theta,
                metrics,
                iters: args.iters,
            };
            print_json(&api::engine(&body, &config)?)
        }
    }
}
