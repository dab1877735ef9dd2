//! GSI Relay
//!
//! Runs the ingestion server from environment configuration and logs a
//! summary line whenever a new update has been merged.

use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gsi_relay::{IngestionServer, ServerConfig, VERSION};

/// How often the summary is checked.
const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("GSI Relay v{}", VERSION);

    let config = ServerConfig::from_env();
    info!("Port: {}", config.port);
    if !config.filtered_players.is_empty() {
        info!("Filtered players: {}", config.filtered_players);
    }

    let mut server = IngestionServer::start(config).context("failed to start ingestion server")?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(SUMMARY_INTERVAL);
    let mut last_heartbeat = 0;

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("failed to listen for Ctrl-C")?;
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let heartbeat = server.heartbeat();
                if heartbeat != last_heartbeat {
                    last_heartbeat = heartbeat;
                    log_summary(&server, heartbeat);
                }
            }
        }
    }

    // joining the worker blocks for up to one accept poll
    tokio::task::spawn_blocking(move || server.stop())
        .await
        .context("stop task failed")??;

    info!("Stopped");
    Ok(())
}

fn log_summary(server: &IngestionServer, heartbeat: u64) {
    let map = server.try_get_map_name().unwrap_or_else(|| "-".to_string());
    let round = server.try_get_hud_view().map_or(0, |hud| hud.round.number);
    let players = server.try_get_radar_players().map_or(0, |p| p.len());
    let smokes = server.try_get_smokes().unwrap_or_default();
    let detonated = smokes.iter().filter(|s| s.is_detonated()).count();

    info!(
        "Heartbeat {}: map {}, round {}, {} players on radar, {} smokes ({} detonated)",
        heartbeat, map, round, players, smokes.len(), detonated
    );
}
