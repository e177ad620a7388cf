//! CLI argument parsing and subcommand dispatch.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use cidvault_core::config::ServerConfig;

use crate::csv::parse_cid_list;
use crate::{db, startup};

/// cidvault: IPFS metadata ingestion service.
#[derive(Parser, Debug)]
#[command(name = "cidvault", version, about)]
pub struct Cli {
    /// Override API_HOST.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Override API_PORT.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default).
    Serve,
    /// Apply database migrations and exit.
    Migrate,
    /// Ingest a local CSV of CIDs, wait for completion, and exit.
    Ingest {
        /// CSV file whose first column holds CIDs.
        file: PathBuf,
    },
}

impl Cli {
    pub fn apply_overrides(&self, server: &mut ServerConfig) {
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
    }
}

/// Run a non-serve subcommand.
///
/// Returns `Ok(true)` if a subcommand was handled, `Ok(false)` if `serve`
/// should be started (handled by the caller).
pub async fn dispatch(config: &cidvault_core::Config, command: Option<&Command>) -> anyhow::Result<bool> {
    match command {
        None | Some(Command::Serve) => Ok(false),
        Some(Command::Migrate) => {
            let pool = db::init_pg_pool(&config.postgres)
                .await?
                .context("DATABASE_URL must be set to run migrations")?;
            pool.close().await;
            Ok(true)
        }
        Some(Command::Ingest { file }) => {
            ingest_file(config, file).await?;
            Ok(true)
        }
    }
}

async fn ingest_file(config: &cidvault_core::Config, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let cids = parse_cid_list(&bytes).with_context(|| format!("failed to parse {}", file.display()))?;
    info!("Read {} CIDs from {}", cids.len(), file.display());

    let ingestor = startup::build_ingestor(config).await?;
    let batch_id = ingestor.ingest(cids);

    // A local run has no grace window: wait for every unit.
    while !ingestor.drain(std::time::Duration::from_secs(30)).await {
        info!("Still ingesting, {} units pending", ingestor.pending());
    }

    if let Some(status) = ingestor.batch_status(&batch_id) {
        info!(
            "Batch {} finished: {} stored, {} fetch failures, {} store failures",
            status.id, status.stored, status.fetch_failed, status.store_failed
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_config() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".into(),
            port: 8080,
            request_timeout_secs: 10,
            upload_max_bytes: 32 * 1024,
        }
    }

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["cidvault"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_ingest_with_file() {
        let cli = Cli::try_parse_from(["cidvault", "ingest", "cids.csv"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Ingest {
                file: PathBuf::from("cids.csv")
            })
        );
    }

    #[test]
    fn overrides_host_and_port() {
        let cli = Cli::try_parse_from(["cidvault", "serve", "--port", "9090", "--host", "127.0.0.1"])
            .unwrap();
        let mut server = server_config();
        cli.apply_overrides(&mut server);
        assert_eq!(server.port, 9090);
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.request_timeout_secs, 10);
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let cli = Cli::try_parse_from(["cidvault", "serve"]).unwrap();
        let mut server = server_config();
        cli.apply_overrides(&mut server);
        assert_eq!(server.port, 8080);
        assert_eq!(server.host, "0.0.0.0");
    }
}
