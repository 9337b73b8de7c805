//! Maps conversations to hub channels, creating channels on first contact.

use std::{sync::Arc, time::Duration};

use {
    dashmap::DashMap,
    tokio::{sync::Mutex, time::Instant},
    tracing::{debug, info},
};

use crate::{
    Error, HubClient, Result,
    error::with_timeout,
    types::{Channel, ChannelKind, IdentityKey, NewChannel, Workspace},
};

/// How long a freshly created channel is trusted when the hub listing does
/// not show it yet.
const CREATED_GRACE: Duration = Duration::from_secs(30);

/// Name of the category `channel` belongs to, if any.
pub fn parent_name<'a>(channels: &'a [Channel], channel: &Channel) -> Option<&'a str> {
    let parent_id = channel.parent_id.as_ref()?;
    channels
        .iter()
        .find(|c| &c.id == parent_id && c.is_category())
        .map(|c| c.name.as_str())
}

/// Find the text channel bound to `key` under the key's category.
///
/// The topic is matched first: the hub may rewrite channel names on creation
/// (Discord lowercases them and turns spaces into `-`) but keeps topics as
/// given. A channel without the topic still matches on its exact name.
pub fn find_conversation_channel(channels: &[Channel], key: &IdentityKey) -> Option<Channel> {
    let candidates = || {
        channels
            .iter()
            .filter(|c| c.is_text() && parent_name(channels, c) == Some(key.category_name()))
    };
    candidates()
        .find(|c| c.topic.as_deref() == Some(key.topic()))
        .or_else(|| candidates().find(|c| c.name == key.name))
        .cloned()
}

fn find_category<'a>(channels: &'a [Channel], name: &str) -> Option<&'a Channel> {
    channels.iter().find(|c| c.is_category() && c.name == name)
}

/// Resolves identity keys to hub channels.
///
/// Lookup-then-create for one key runs under that key's lock, so two messages
/// from a new contact never produce two channels. Locks are dropped once no
/// caller holds or awaits them; created channels are remembered only until the
/// hub listing shows them or the grace period ends.
pub struct ChannelDirectory {
    hub: Arc<dyn HubClient>,
    timeout: Duration,
    locks: DashMap<IdentityKey, Arc<Mutex<()>>>,
    created: DashMap<IdentityKey, (Channel, Instant)>,
}

impl ChannelDirectory {
    pub fn new(hub: Arc<dyn HubClient>, timeout: Duration) -> Self {
        Self {
            hub,
            timeout,
            locks: DashMap::new(),
            created: DashMap::new(),
        }
    }

    fn lock_for(&self, key: &IdentityKey) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(key.clone()).or_default().value())
    }

    fn recently_created(&self, key: &IdentityKey) -> Option<Channel> {
        let (channel, at) = self.created.get(key).map(|entry| entry.value().clone())?;
        if at.elapsed() < CREATED_GRACE {
            return Some(channel);
        }
        self.created.remove(key);
        None
    }

    fn remember_created(&self, key: &IdentityKey, channel: &Channel) {
        self.created.retain(|_, (_, at)| at.elapsed() < CREATED_GRACE);
        self.created
            .insert(key.clone(), (channel.clone(), Instant::now()));
    }

    /// Return the channel for `key`, creating it under the right category if
    /// it does not exist yet.
    pub async fn resolve_or_create(
        &self,
        workspace: &Workspace,
        key: &IdentityKey,
    ) -> Result<Channel> {
        let lock = self.lock_for(key);
        let result = {
            let _guard = lock.lock().await;
            self.resolve_locked(workspace, key).await
        };
        drop(lock);
        // Only the map holds it now: nobody is waiting on this key.
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn resolve_locked(&self, workspace: &Workspace, key: &IdentityKey) -> Result<Channel> {
        let channels = with_timeout(
            "list channels",
            self.timeout,
            self.hub.channels(&workspace.id),
        )
        .await?;

        if let Some(existing) = find_conversation_channel(&channels, key) {
            self.created.remove(key);
            debug!(conversation = %key, channel = %existing.id, "resolved existing channel");
            return Ok(existing);
        }

        if let Some(pending) = self.recently_created(key) {
            debug!(conversation = %key, channel = %pending.id, "channel created moments ago");
            return Ok(pending);
        }

        let category = find_category(&channels, key.category_name()).ok_or_else(|| {
            Error::MissingCategory {
                name: key.category_name().to_string(),
            }
        })?;

        let request = NewChannel {
            name: key.name.clone(),
            kind: ChannelKind::Text,
            parent_id: Some(category.id.clone()),
            topic: Some(key.topic().to_string()),
        };
        let channel = with_timeout(
            "create channel",
            self.timeout,
            self.hub.create_channel(&workspace.id, request),
        )
        .await?;

        info!(
            workspace = %workspace.name,
            conversation = %key,
            channel = %channel.id,
            "created channel for conversation"
        );
        self.remember_created(key, &channel);
        Ok(channel)
    }
}
