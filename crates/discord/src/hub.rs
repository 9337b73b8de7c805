use std::sync::Arc;

use {
    async_trait::async_trait,
    parley_bridge::{
        Channel, ChannelId, HubClient, NewChannel, Result, Workspace, WorkspaceId,
    },
    serenity::{all::CreateChannel, http::Http},
    tracing::debug,
};

use crate::{
    convert::{channel_id, discord_channel_type, guild_id, to_channel, to_workspace},
    error::Error,
};

/// [`HubClient`] over Discord's REST API.
///
/// Channel listing always goes to the API rather than the gateway cache, so
/// a channel is visible as soon as its creation call returns.
#[derive(Clone)]
pub struct DiscordHub {
    http: Arc<Http>,
}

impl DiscordHub {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HubClient for DiscordHub {
    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        let guilds = self
            .http
            .get_guilds(None, None)
            .await
            .map_err(|e| Error::from(e).into_bridge("list guilds"))?;
        Ok(guilds.iter().map(to_workspace).collect())
    }

    async fn channels(&self, workspace: &WorkspaceId) -> Result<Vec<Channel>> {
        let guild = guild_id(workspace).map_err(|e| e.into_bridge("list channels"))?;
        let channels = self
            .http
            .get_channels(guild)
            .await
            .map_err(|e| Error::from(e).into_bridge("list channels"))?;
        debug!(workspace = %workspace, count = channels.len(), "listed discord channels");
        Ok(channels.iter().map(to_channel).collect())
    }

    async fn create_channel(&self, workspace: &WorkspaceId, channel: NewChannel) -> Result<Channel> {
        let guild = guild_id(workspace).map_err(|e| e.into_bridge("create channel"))?;

        let mut builder =
            CreateChannel::new(channel.name.as_str()).kind(discord_channel_type(channel.kind));
        if let Some(parent) = &channel.parent_id {
            let parent = channel_id(parent).map_err(|e| e.into_bridge("create channel"))?;
            builder = builder.category(parent);
        }
        if let Some(topic) = &channel.topic {
            builder = builder.topic(topic.as_str());
        }

        let created = guild
            .create_channel(&self.http, builder)
            .await
            .map_err(|e| Error::from(e).into_bridge("create channel"))?;
        Ok(to_channel(&created))
    }

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let target = channel_id(channel).map_err(|e| e.into_bridge("send message"))?;
        target
            .say(&self.http, text)
            .await
            .map_err(|e| Error::from(e).into_bridge("send message"))?;
        Ok(())
    }
}
