//! Conversions between serenity models and bridge types.

use {
    parley_bridge::{Channel, ChannelId, ChannelKind, HubMessage, Workspace, WorkspaceId},
    serenity::all::{
        ChannelId as DiscordChannelId, ChannelType, GuildChannel, GuildId, GuildInfo, Message,
    },
};

use crate::error::{Error, Result};

fn parse_snowflake(kind: &'static str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(Error::InvalidId {
            kind,
            value: value.to_string(),
        }),
    }
}

pub fn guild_id(id: &WorkspaceId) -> Result<GuildId> {
    parse_snowflake("guild", id.as_str()).map(GuildId::new)
}

pub fn channel_id(id: &ChannelId) -> Result<DiscordChannelId> {
    parse_snowflake("channel", id.as_str()).map(DiscordChannelId::new)
}

pub fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::Category => ChannelKind::Category,
        _ => ChannelKind::Other,
    }
}

pub fn discord_channel_type(kind: ChannelKind) -> ChannelType {
    match kind {
        ChannelKind::Category => ChannelType::Category,
        ChannelKind::Text | ChannelKind::Other => ChannelType::Text,
    }
}

pub fn to_channel(channel: &GuildChannel) -> Channel {
    Channel {
        id: ChannelId::new(channel.id.to_string()),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
        parent_id: channel.parent_id.map(|p| ChannelId::new(p.to_string())),
        topic: channel.topic.clone(),
    }
}

pub fn to_workspace(guild: &GuildInfo) -> Workspace {
    Workspace {
        id: WorkspaceId::new(guild.id.to_string()),
        name: guild.name.clone(),
    }
}

/// The fields of a gateway message the bridge looks at.
#[derive(Debug, Clone)]
pub struct IncomingPost<'a> {
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub content: &'a str,
}

impl<'a> From<&'a Message> for IncomingPost<'a> {
    fn from(msg: &'a Message) -> Self {
        Self {
            guild_id: msg.guild_id.map(|g| g.get()),
            channel_id: msg.channel_id.get(),
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            content: &msg.content,
        }
    }
}

impl IncomingPost<'_> {
    /// `bot_user_id` is the bridge's own account, known once the gateway is ready.
    pub fn into_hub_message(self, bot_user_id: Option<u64>) -> HubMessage {
        HubMessage {
            author_is_bot: self.author_is_bot,
            author_is_bridge: bot_user_id == Some(self.author_id),
            workspace_id: self.guild_id.map(|g| WorkspaceId::new(g.to_string())),
            channel_id: ChannelId::new(self.channel_id.to_string()),
            content: self.content.to_string(),
        }
    }
}
