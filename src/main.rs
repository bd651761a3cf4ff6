//! AIS relay server
//!
//! Usage:
//!   AIS_API_KEY=... ORIGIN=http://localhost:3000 cargo run
//!
//! Variables may also be placed in a `.env` file. Log verbosity follows
//! `RUST_LOG` (default `ais_relay=info`).

use std::time::Duration;

use ais_relay::config::RelayConfig;
use ais_relay::hub::Hub;
use ais_relay::server::RelayServer;
use ais_relay::upstream::{UpstreamMonitor, UpstreamSupervisor, WsConnector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ais_relay=info".parse()?),
        )
        .init();

    let hub = Hub::spawn(config.hub.clone());

    let supervisor = UpstreamSupervisor::new(hub.clone(), WsConnector, config.upstream.clone());
    let monitor = supervisor.monitor();
    supervisor.spawn();

    tokio::spawn(log_stats(hub.clone(), monitor, config.stats_interval));

    tracing::info!(
        origin = %config.server.allowed_origin,
        upstream = %config.upstream.url,
        "Starting AIS relay"
    );

    let server = RelayServer::new(config.server, hub);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Relay stopped");
    Ok(())
}

async fn log_stats(hub: Hub, upstream: UpstreamMonitor, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let hub_stats = hub.stats().await;
        let feed = upstream.stats();

        tracing::info!(
            subscribers = hub_stats.active_subscribers,
            registered = hub_stats.total_registered,
            evicted = hub_stats.evicted,
            broadcast = hub_stats.events_broadcast,
            fanout = hub_stats.fanout(),
            upstream = %upstream.state(),
            received = feed.messages_received,
            forwarded = feed.events_forwarded,
            skipped = feed.skipped(),
            decode_errors = feed.decode_errors,
            events_per_sec = feed.event_rate(),
            uptime_secs = feed.uptime.as_secs(),
            "Relay statistics"
        );
    }
}
