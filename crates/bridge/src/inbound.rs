//! Messaging side → hub.

use std::sync::Arc;

use tracing::debug;

use crate::{
    Result,
    error::with_timeout,
    runtime::BridgeContext,
    types::{Channel, InboundMessage},
};

/// Outcome of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Sent by the bridge's own account; dropped.
    Echo,
    Delivered { channel: Channel },
}

/// Forwards messaging-side messages into their mirrored hub channel.
pub struct InboundRelay {
    ctx: Arc<BridgeContext>,
}

impl InboundRelay {
    pub fn new(ctx: Arc<BridgeContext>) -> Self {
        Self { ctx }
    }

    pub async fn handle(&self, msg: &InboundMessage) -> Result<InboundOutcome> {
        if msg.is_self {
            debug!(chat = %msg.chat_id, "dropping echo of own message");
            return Ok(InboundOutcome::Echo);
        }

        let key = msg.identity_key();
        let channel = self
            .ctx
            .directory
            .resolve_or_create(&self.ctx.workspace, &key)
            .await?;

        with_timeout(
            "send hub message",
            self.ctx.timeout,
            self.ctx.hub.send_text(&channel.id, msg.content.render()),
        )
        .await?;

        debug!(channel = %channel.id, conversation = %key, "relayed message to hub");
        Ok(InboundOutcome::Delivered { channel })
    }
}
