//! Gateway client lifecycle.

use std::sync::Arc;

use {
    parley_bridge::HubEvent,
    parley_config::DiscordConfig,
    secrecy::ExposeSecret,
    serenity::{Client, gateway::ShardManager},
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{error, info},
};

use crate::{error::Result, handler::DiscordHandler, hub::DiscordHub};

/// A running Discord gateway connection.
pub struct DiscordConnection {
    pub hub: Arc<DiscordHub>,
    shard_manager: Arc<ShardManager>,
    task: JoinHandle<()>,
}

impl DiscordConnection {
    /// Close every shard and wait for the gateway task to finish.
    pub async fn shutdown(self) {
        self.shard_manager.shutdown_all().await;
        if let Err(e) = self.task.await {
            error!(error = %e, "discord gateway task panicked");
        }
    }
}

/// Build the serenity client and run the gateway in a background task.
///
/// Gateway events are forwarded to `events`; the first one is
/// [`HubEvent::Ready`] once the bot is logged in.
pub async fn start(config: &DiscordConfig, events: mpsc::Sender<HubEvent>) -> Result<DiscordConnection> {
    let handler = DiscordHandler::new(events);
    let mut client = Client::builder(config.token.expose_secret(), DiscordHandler::intents())
        .event_handler(handler)
        .await?;

    let hub = Arc::new(DiscordHub::new(Arc::clone(&client.http)));
    let shard_manager = Arc::clone(&client.shard_manager);

    let task = tokio::spawn(async move {
        info!("connecting to discord gateway");
        if let Err(e) = client.start().await {
            error!(error = %e, "discord gateway stopped");
        }
    });

    Ok(DiscordConnection {
        hub,
        shard_manager,
        task,
    })
}
