//! In-memory hub and messaging fakes shared by the unit tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    Error, HubClient, MessagingClient, Result,
    types::{
        Channel, ChannelId, ChannelKind, Conversation, ConversationId, ConversationKind,
        DIRECT_MESSAGES_CATEGORY, GROUPS_CATEGORY, MAIN_CHANNEL, NewChannel, Workspace,
        WorkspaceId,
    },
};

pub const WORKSPACE: &str = "guild-1";

#[derive(Debug)]
struct FakeFailure(String);

impl std::fmt::Display for FakeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FakeFailure {}

pub fn failure(message: &str) -> Error {
    Error::external("fake", FakeFailure(message.to_string()))
}

pub fn workspace() -> Workspace {
    Workspace {
        id: WorkspaceId::new(WORKSPACE),
        name: "home".into(),
    }
}

#[derive(Default)]
pub struct FakeHub {
    pub channels: Mutex<Vec<Channel>>,
    pub sent: Mutex<Vec<(ChannelId, String)>>,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    next_id: AtomicU64,
    /// Creation of a channel with this name fails.
    pub fail_create: Mutex<Option<String>>,
    /// Sending to a channel fails.
    pub fail_send: Mutex<bool>,
    /// Artificial latency for creation, to widen race windows.
    pub create_delay: Option<Duration>,
    /// Created channels do not show up in `channels()`.
    pub lagging_cache: bool,
    /// Text channel names are lowercased with spaces turned into `-` on
    /// creation, the way Discord stores them.
    pub normalize_names: bool,
    /// Returned by `workspaces()`.
    pub workspaces: Mutex<Vec<Workspace>>,
}

impl FakeHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_create_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            create_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn lagging() -> Arc<Self> {
        Arc::new(Self {
            lagging_cache: true,
            ..Self::default()
        })
    }

    /// Hub that already contains `main` and both managed categories.
    pub fn scaffolded() -> Arc<Self> {
        Self::scaffold(Self::new())
    }

    /// Scaffolded hub that rewrites text channel names on creation.
    pub fn normalizing() -> Arc<Self> {
        Self::scaffold(Arc::new(Self {
            normalize_names: true,
            ..Self::default()
        }))
    }

    fn scaffold(hub: Arc<Self>) -> Arc<Self> {
        hub.insert(MAIN_CHANNEL, ChannelKind::Text, None, None);
        hub.insert(DIRECT_MESSAGES_CATEGORY, ChannelKind::Category, None, None);
        hub.insert(GROUPS_CATEGORY, ChannelKind::Category, None, None);
        hub
    }

    pub fn insert(
        &self,
        name: &str,
        kind: ChannelKind,
        parent_id: Option<ChannelId>,
        topic: Option<&str>,
    ) -> Channel {
        let channel = Channel {
            id: self.allocate_id(),
            name: name.to_string(),
            kind,
            parent_id,
            topic: topic.map(str::to_string),
        };
        self.channels.lock().unwrap().push(channel.clone());
        channel
    }

    /// Insert a text channel under a named category.
    pub fn insert_under(&self, category: &str, name: &str, topic: Option<&str>) -> Channel {
        let parent = self.find(category, ChannelKind::Category).map(|c| c.id);
        self.insert(name, ChannelKind::Text, parent, topic)
    }

    pub fn find(&self, name: &str, kind: ChannelKind) -> Option<Channel> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name && c.kind == kind)
            .cloned()
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.name == name)
            .count()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn allocate_id(&self) -> ChannelId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        ChannelId::new(format!("c{n}"))
    }
}

#[async_trait]
impl HubClient for FakeHub {
    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        Ok(self.workspaces.lock().unwrap().clone())
    }

    async fn channels(&self, _workspace: &WorkspaceId) -> Result<Vec<Channel>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn create_channel(
        &self,
        _workspace: &WorkspaceId,
        channel: NewChannel,
    ) -> Result<Channel> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_create.lock().unwrap().as_deref() == Some(channel.name.as_str()) {
            return Err(failure("missing permissions"));
        }
        let name = if self.normalize_names && channel.kind == ChannelKind::Text {
            channel.name.to_lowercase().replace(' ', "-")
        } else {
            channel.name
        };
        let created = Channel {
            id: self.allocate_id(),
            name,
            kind: channel.kind,
            parent_id: channel.parent_id,
            topic: channel.topic,
        };
        if !self.lagging_cache {
            self.channels.lock().unwrap().push(created.clone());
        }
        Ok(created)
    }

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()> {
        if *self.fail_send.lock().unwrap() {
            return Err(failure("send rejected"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.clone(), text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMessaging {
    pub conversations: Mutex<Vec<Conversation>>,
    pub sent: Mutex<Vec<(ConversationId, String)>>,
    pub list_calls: AtomicUsize,
    pub fail_send: bool,
}

impl FakeMessaging {
    pub fn with(conversations: Vec<Conversation>) -> Arc<Self> {
        Arc::new(Self {
            conversations: Mutex::new(conversations),
            ..Self::default()
        })
    }

    pub fn failing(conversations: Vec<Conversation>) -> Arc<Self> {
        Arc::new(Self {
            conversations: Mutex::new(conversations),
            fail_send: true,
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<(ConversationId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

pub fn conversation(id: &str, name: &str, kind: ConversationKind) -> Conversation {
    Conversation {
        id: ConversationId::new(id),
        name: name.to_string(),
        kind,
    }
}

#[async_trait]
impl MessagingClient for FakeMessaging {
    async fn conversations(&self) -> Result<Vec<Conversation>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn send_text(&self, conversation: &ConversationId, text: &str) -> Result<()> {
        if self.fail_send {
            return Err(failure("not connected"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((conversation.clone(), text.to_string()));
        Ok(())
    }
}
