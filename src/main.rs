use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use adblockd::api;
use adblockd::blocklist::HttpFetcher;
use adblockd::config::Config;
use adblockd::coordinator::UpdateCoordinator;
use adblockd::dnsmasq::CommandReloader;
use adblockd::init::setup_logging;
use adblockd::scheduler;
use adblockd::settings::{self, FileStore, SettingsStore};
use adblockd::{blocklist::Fetcher, dnsmasq::ServiceReloader, net};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("adblockd.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting adblockd...");

    if !std::path::Path::new(&config_path).exists() {
        info!("Config file not found, using defaults.");
    }

    // 3. Open Settings Store & Seed Defaults
    let store = FileStore::open(&config.settings_path)
        .await
        .context("Failed to open settings store")?;
    let settings: Arc<dyn SettingsStore> = Arc::new(store);

    let network = net::probe().await;
    settings::apply_defaults(settings.as_ref(), &network)
        .await
        .context("Failed to seed default settings")?;

    // 4. Build Coordinator
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(
        Duration::from_secs(config.fetch.timeout_secs),
        config.fetch.concurrent_downloads,
    )?);
    let reloader: Arc<dyn ServiceReloader> = Arc::new(
        CommandReloader::new(&config.reload_command).context("Invalid reload command")?,
    );
    let coordinator = Arc::new(UpdateCoordinator::new(
        config.clone(),
        settings.clone(),
        fetcher,
        reloader,
    ));

    // 5. Trigger Channels (edge-triggered, capacity 1: redundant triggers drop)
    let (refresh_tx, mut refresh_rx) = tokio::sync::mpsc::channel::<()>(1);
    let (configure_tx, mut configure_rx) = tokio::sync::mpsc::channel::<()>(1);

    let trigger_coordinator = coordinator.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = refresh_rx.recv() => {
                    info!("Blocklist refresh triggered via API");
                    if let Err(e) = trigger_coordinator.refresh_blocklist().await {
                        error!("Triggered refresh failed: {}", e);
                    }
                }
                Some(()) = configure_rx.recv() => {
                    info!("Configuration apply triggered via API");
                    if let Err(e) = trigger_coordinator.apply_configuration(true).await {
                        error!("Triggered apply failed: {}", e);
                    }
                }
                else => break,
            }
        }
    });

    // 6. Spawn Scheduler
    tokio::spawn(scheduler::run(coordinator.clone(), settings.clone()));

    // 7. Start API Server
    let api_status = coordinator.status();
    let api_settings = settings.clone();
    let api_port = config.api_port;
    tokio::spawn(async move {
        api::start_api_server(api_status, api_settings, refresh_tx, configure_tx, api_port).await;
    });

    // 8. Graceful Shutdown
    signal::ctrl_c().await?;
    info!("Shutdown signal received.");

    Ok(())
}
