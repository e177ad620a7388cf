mod api;
mod auth;
mod cli;
mod csv;
mod db;
mod router;
mod startup;
mod state;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn load_config() -> cidvault_core::Config {
    cidvault_core::config::load_dotenv();
    cidvault_core::Config::from_env()
}

async fn serve(config: &cidvault_core::Config) -> anyhow::Result<()> {
    let state = startup::build_app_state(config).await?;
    let app = router::build_router(state.clone(), config.server.request_timeout());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let grace = config.ingest.shutdown_grace();
    info!(
        "HTTP server stopped, waiting up to {:?} for {} in-flight units",
        grace,
        state.ingestor.pending()
    );
    if !state.ingestor.drain(grace).await {
        warn!(
            "Shutdown grace elapsed with {} units still pending; they will be dropped",
            state.ingestor.pending()
        );
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = cli::Cli::parse();
    let mut config = load_config();
    cli.apply_overrides(&mut config.server);
    config.log_summary();

    if !cli::dispatch(&config, cli.command.as_ref()).await? {
        serve(&config).await?;
    }

    Ok(())
}
