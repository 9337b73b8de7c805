//! WhatsApp side of the bridge.
//!
//! Talks to a WhatsApp Web sidecar (Baileys) over a local WebSocket using a
//! JSON protocol, and implements [`parley_bridge::MessagingClient`] on top.

pub mod client;
pub mod error;
pub mod sidecar;
pub mod types;

pub use {
    client::{WhatsAppClient, start},
    error::{Error, Result},
    sidecar::{SidecarHandle, connect_with_retry},
};
