//! Synchronization and routing engine for the WhatsApp ↔ Discord bridge.
//!
//! Mirrors every messaging-side conversation as a text channel inside a single
//! hub workspace and relays messages in both directions. Platform SDKs are
//! reached only through the [`HubClient`] and [`MessagingClient`] traits.

pub mod directory;
pub mod error;
pub mod guard;
pub mod hub;
pub mod inbound;
pub mod messaging;
pub mod outbound;
pub mod runtime;
pub mod structure;
pub mod types;

#[cfg(test)]
mod testing;

pub use {
    directory::ChannelDirectory,
    error::{Error, Result},
    guard::ensure_single_workspace,
    hub::{HubClient, HubEvent},
    inbound::InboundRelay,
    messaging::{MessagingClient, MessagingEvent},
    outbound::OutboundRelay,
    runtime::{ActiveBridge, Bridge, BridgeContext, BridgeSettings},
    structure::StructureSynchronizer,
    types::{
        Channel, ChannelId, ChannelKind, Conversation, ConversationId, ConversationKind,
        HubMessage, IdentityKey, InboundMessage, MessageContent, NewChannel, Workspace,
        WorkspaceId,
    },
};
