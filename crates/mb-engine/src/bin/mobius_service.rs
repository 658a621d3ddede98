use mb_engine::{logging, router, EngineConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(false)?;

    let config = Arc::new(EngineConfig::load()?);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "mobius service listening");

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("mobius service stopped");
    Ok(())
}
