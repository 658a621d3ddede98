use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a console subscriber writing to stderr, so JSON on stdout stays
/// clean. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::debug!(verbose, "logging initialized");
    Ok(())
}
