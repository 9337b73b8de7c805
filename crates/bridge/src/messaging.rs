use async_trait::async_trait;

use crate::{
    Result,
    types::{Conversation, ConversationId, InboundMessage},
};

/// Events delivered by the messaging SDK.
#[derive(Debug, Clone)]
pub enum MessagingEvent {
    Connected,
    Disconnected { reason: String },
    Message(InboundMessage),
}

/// Operations the bridge needs from the messaging (WhatsApp) SDK.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Live list of chats. Never cached by the bridge.
    async fn conversations(&self) -> Result<Vec<Conversation>>;

    async fn send_text(&self, conversation: &ConversationId, text: &str) -> Result<()>;
}
