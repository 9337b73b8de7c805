use std::{path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result, bail},
    parley_bridge::{Bridge, BridgeSettings, HubClient},
    parley_config::Severity,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::check_command;

const EVENT_BUFFER: usize = 256;

pub async fn run(path: Option<&Path>) -> Result<()> {
    let (result, config) = check_command::diagnose(path);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    let Some(config) = config.filter(|_| !result.has_errors()) else {
        bail!("invalid configuration; run `parley check` for details");
    };

    let (hub_tx, hub_rx) = mpsc::channel(EVENT_BUFFER);
    let (chat_tx, chat_rx) = mpsc::channel(EVENT_BUFFER);

    let whatsapp = parley_whatsapp::start(&config.whatsapp, chat_tx)
        .await
        .context("failed to connect to the whatsapp sidecar")?;
    let discord = parley_discord::start(&config.discord, hub_tx)
        .await
        .context("failed to start the discord client")?;

    let settings = BridgeSettings {
        request_timeout: Duration::from_secs(config.bridge.request_timeout_secs),
    };
    let hub: Arc<dyn HubClient> = discord.hub.clone();
    let bridge = Bridge::new(hub, Arc::new(whatsapp), settings);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
        }
        signal.cancel();
    });

    let outcome = bridge.run_until_ready(hub_rx, chat_rx, shutdown).await;
    discord.shutdown().await;
    outcome?;

    info!("parley stopped");
    Ok(())
}
