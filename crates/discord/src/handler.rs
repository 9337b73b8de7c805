//! Discord event handler for serenity.
//!
//! Forwards gateway events to the bridge as [`HubEvent`]s.

use std::sync::{Arc, OnceLock};

use {
    parley_bridge::{HubEvent, Workspace, WorkspaceId},
    serenity::{
        all::{Context, EventHandler, GatewayIntents, GuildId, Message, Ready},
        async_trait,
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::convert::{IncomingPost, to_workspace};

/// Handler for Discord gateway events.
pub struct DiscordHandler {
    events: mpsc::Sender<HubEvent>,
    bot_user_id: Arc<OnceLock<u64>>,
}

impl DiscordHandler {
    pub fn new(events: mpsc::Sender<HubEvent>) -> Self {
        Self {
            events,
            bot_user_id: Arc::new(OnceLock::new()),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    async fn emit(&self, event: HubEvent) {
        if self.events.send(event).await.is_err() {
            warn!("bridge stopped listening; dropping discord event");
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        if self.bot_user_id.set(ready.user.id.get()).is_err() {
            debug!("discord gateway resumed");
        }

        // Ready only carries guild ids; names come from REST.
        let workspaces = match ctx.http.get_guilds(None, None).await {
            Ok(guilds) => guilds.iter().map(to_workspace).collect(),
            Err(e) => {
                warn!(error = %e, "failed to fetch guild names, using ids");
                ready
                    .guilds
                    .iter()
                    .map(|g| Workspace {
                        id: WorkspaceId::new(g.id.to_string()),
                        name: g.id.to_string(),
                    })
                    .collect::<Vec<_>>()
            },
        };

        info!(
            bot_name = %ready.user.name,
            guilds = workspaces.len(),
            "discord bot ready"
        );
        self.emit(HubEvent::Ready { workspaces }).await;
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let post = IncomingPost::from(&msg);
        let message = post.into_hub_message(self.bot_user_id.get().copied());
        self.emit(HubEvent::MessageCreated(message)).await;
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }
}
