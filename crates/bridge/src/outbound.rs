//! Hub → messaging side.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Error, Result,
    directory::parent_name,
    error::with_timeout,
    runtime::BridgeContext,
    types::{Conversation, ConversationId, ConversationKind, HubMessage},
};

/// Why a hub message was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Posted by a bot, including the bridge itself.
    BotAuthor,
    /// Sent in a direct message to the bot rather than in a channel.
    DirectContext,
    /// Posted in a workspace the bridge does not manage.
    ForeignWorkspace,
    /// The channel is not in the workspace listing.
    UnknownChannel,
    NotText,
    /// The channel is not under "Direct messages" or "Groups".
    Unmanaged,
    /// Nothing textual to forward (e.g. attachment-only post).
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOutcome {
    Ignored(IgnoreReason),
    Delivered { conversation: ConversationId },
}

/// Pick the conversation a channel topic points at.
///
/// Display names are not unique. Candidates of the kind implied by the
/// channel's category are preferred; among equals the first listed wins.
pub fn select_conversation<'a>(
    conversations: &'a [Conversation],
    target: &str,
    kind: ConversationKind,
) -> Option<&'a Conversation> {
    let named: Vec<&Conversation> = conversations.iter().filter(|c| c.name == target).collect();
    let same_kind: Vec<&Conversation> = named.iter().copied().filter(|c| c.kind == kind).collect();
    let candidates = if same_kind.is_empty() {
        named
    } else {
        same_kind
    };

    if candidates.len() > 1 {
        warn!(
            target,
            candidates = candidates.len(),
            "several chats share this name, using the first"
        );
    }
    candidates.first().copied()
}

/// Forwards replies posted in managed hub channels back to their chat.
pub struct OutboundRelay {
    ctx: Arc<BridgeContext>,
}

impl OutboundRelay {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, msg: &HubMessage) -> Result<OutboundOutcome> {
        let ignored = |reason: IgnoreReason| -> Result<OutboundOutcome> {
            debug!(channel = %msg.channel_id, ?reason, "ignoring hub message");
            Ok(OutboundOutcome::Ignored(reason))
        };

        if msg.author_is_bot || msg.author_is_bridge {
            return ignored(IgnoreReason::BotAuthor);
        }
        let Some(workspace_id) = &msg.workspace_id else {
            return ignored(IgnoreReason::DirectContext);
        };
        if *workspace_id != self.ctx.workspace.id {
            return ignored(IgnoreReason::ForeignWorkspace);
        }

        let channels = with_timeout(
            "list channels",
            self.ctx.timeout,
            self.ctx.hub.channels(workspace_id),
        )
        .await?;
        let Some(channel) = channels.iter().find(|c| c.id == msg.channel_id) else {
            return ignored(IgnoreReason::UnknownChannel);
        };
        if !channel.is_text() {
            return ignored(IgnoreReason::NotText);
        }
        let Some(kind) = parent_name(&channels, channel).and_then(ConversationKind::from_category)
        else {
            return ignored(IgnoreReason::Unmanaged);
        };
        if msg.content.is_empty() {
            return ignored(IgnoreReason::Empty);
        }

        let target = channel.topic.as_deref().unwrap_or_default();
        let conversations = with_timeout(
            "list chats",
            self.ctx.timeout,
            self.ctx.messaging.conversations(),
        )
        .await?;
        let Some(conversation) = select_conversation(&conversations, target, kind) else {
            return Err(Error::ConversationNotFound {
                name: target.to_string(),
            });
        };

        with_timeout(
            "send chat message",
            self.ctx.timeout,
            self.ctx.messaging.send_text(&conversation.id, &msg.content),
        )
        .await?;

        debug!(
            channel = %channel.id,
            conversation = %conversation.id,
            "relayed hub message to chat"
        );
        Ok(OutboundOutcome::Delivered {
            conversation: conversation.id.clone(),
        })
    }
}
