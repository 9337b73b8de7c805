//! Discord side of the bridge, built on serenity.
//!
//! [`DiscordHandler`] turns gateway events into [`parley_bridge::HubEvent`]s
//! and [`DiscordHub`] implements [`parley_bridge::HubClient`] over the REST
//! client.

pub mod client;
pub mod convert;
pub mod error;
pub mod handler;
pub mod hub;

pub use {
    client::{DiscordConnection, start},
    error::{Error, Result},
    handler::DiscordHandler,
    hub::DiscordHub,
};
