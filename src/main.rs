//! Subtraction Arena Server
//!
//! Hosts battles over WebSocket and logs settled outcomes.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use subtraction_arena::{
    VERSION,
    network::{GameServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("loading server configuration")?;

    info!("Subtraction Arena v{}", VERSION);
    info!(
        "Turn: {}s, timeout limit: {}, clock tick: {:?}",
        config.match_defaults.turn_duration_secs,
        config.match_defaults.timeout_limit,
        config.tick_interval
    );

    let server = Arc::new(GameServer::new(config));

    // Settlement: log every completed battle
    if let Some(mut outcomes) = server.take_outcomes().await {
        tokio::spawn(async move {
            while let Some(outcome) = outcomes.recv().await {
                let size = outcome.to_bytes().map(|b| b.len()).unwrap_or(0);
                info!(
                    match_id = %outcome.match_id,
                    winner = %outcome.winner,
                    reason = ?outcome.reason,
                    rounds = outcome.rounds,
                    payload_bytes = size,
                    "Settled battle, state hash {}",
                    outcome.state_hash_hex()
                );
            }
        });
    }

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_server.shutdown(),
            Err(e) => warn!("Cannot listen for ctrl-c: {}", e),
        }
    });

    server.run().await.context("arena server failed")?;
    info!("Server stopped");

    Ok(())
}
