//! Workspace scaffolding: the `main` channel and the two managed categories.

use std::{sync::Arc, time::Duration};

use {
    futures::future::join_all,
    tracing::{debug, info},
};

use crate::{
    Error, HubClient, Result,
    error::with_timeout,
    types::{
        Channel, ChannelKind, DIRECT_MESSAGES_CATEGORY, GROUPS_CATEGORY, MAIN_CHANNEL, NewChannel,
        Workspace,
    },
};

/// A top-level channel the workspace must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Required {
    pub name: &'static str,
    pub kind: ChannelKind,
}

/// Scaffolding guaranteed by every sync pass.
pub const REQUIRED_CHANNELS: [Required; 3] = [
    Required {
        name: MAIN_CHANNEL,
        kind: ChannelKind::Text,
    },
    Required {
        name: DIRECT_MESSAGES_CATEGORY,
        kind: ChannelKind::Category,
    },
    Required {
        name: GROUPS_CATEGORY,
        kind: ChannelKind::Category,
    },
];

impl Required {
    fn is_satisfied_by(&self, channel: &Channel) -> bool {
        channel.name == self.name && channel.kind == self.kind && channel.is_top_level()
    }
}

/// Required channels absent from `channels`.
pub fn missing_channels(channels: &[Channel]) -> Vec<Required> {
    REQUIRED_CHANNELS
        .iter()
        .filter(|req| !channels.iter().any(|c| req.is_satisfied_by(c)))
        .copied()
        .collect()
}

/// Idempotently creates the workspace scaffolding.
pub struct StructureSynchronizer {
    hub: Arc<dyn HubClient>,
    timeout: Duration,
}

impl StructureSynchronizer {
    pub fn new(hub: Arc<dyn HubClient>, timeout: Duration) -> Self {
        Self { hub, timeout }
    }

    /// Create whatever scaffolding is missing.
    ///
    /// Creations run concurrently and are all awaited before returning, so a
    /// successful return means the structure is complete. Returns the number
    /// of channels created.
    pub async fn sync(&self, workspace: &Workspace) -> Result<usize> {
        info!(workspace = %workspace.name, "syncing workspace structure");

        let channels = with_timeout(
            "list channels",
            self.timeout,
            self.hub.channels(&workspace.id),
        )
        .await
        .map_err(|e| Error::structure_sync("channel list", e))?;

        let missing = missing_channels(&channels);
        if missing.is_empty() {
            debug!(workspace = %workspace.name, "structure already in place");
            return Ok(0);
        }

        let creations = missing.iter().map(|req| async move {
            info!(workspace = %workspace.name, channel = req.name, kind = ?req.kind, "creating channel");
            with_timeout(
                "create channel",
                self.timeout,
                self.hub
                    .create_channel(&workspace.id, NewChannel::top_level(req.name, req.kind)),
            )
            .await
            .map_err(|e| Error::structure_sync(req.name, e))
        });

        let results = join_all(creations).await;
        let created = results.len();
        for result in results {
            result?;
        }

        info!(workspace = %workspace.name, created, "workspace structure synced");
        Ok(created)
    }
}
