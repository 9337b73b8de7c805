use async_trait::async_trait;

use crate::{
    Result,
    types::{Channel, ChannelId, HubMessage, NewChannel, Workspace, WorkspaceId},
};

/// Events delivered by the hub SDK.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// The gateway session is up; carries every workspace visible to the bot.
    Ready { workspaces: Vec<Workspace> },
    MessageCreated(HubMessage),
}

/// Operations the bridge needs from the hub (Discord) SDK.
#[async_trait]
pub trait HubClient: Send + Sync {
    /// Workspaces visible to the bot credential.
    async fn workspaces(&self) -> Result<Vec<Workspace>>;

    /// Current channels of a workspace.
    async fn channels(&self, workspace: &WorkspaceId) -> Result<Vec<Channel>>;

    /// Create a channel and return it as the platform stored it.
    async fn create_channel(&self, workspace: &WorkspaceId, channel: NewChannel)
    -> Result<Channel>;

    /// Post a text message to a channel.
    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()>;
}
