use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the default text channel kept at the top of the workspace.
pub const MAIN_CHANNEL: &str = "main";

/// Category holding one channel per direct (one-to-one) chat.
pub const DIRECT_MESSAGES_CATEGORY: &str = "Direct messages";

/// Category holding one channel per group chat.
pub const GROUPS_CATEGORY: &str = "Groups";

/// Text forwarded in place of a sticker.
pub const STICKER_PLACEHOLDER: &str = "<sticker>";

/// Text forwarded when a message has neither a body nor a known media kind.
pub const UNKNOWN_PLACEHOLDER: &str = "unknown";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Hub workspace (Discord guild) id.
    WorkspaceId
);
string_id!(
    /// Hub channel id.
    ChannelId
);
string_id!(
    /// Messaging-side chat id (e.g. a WhatsApp JID).
    ConversationId
);

/// The hub workspace the bridge manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Text,
    Category,
    Other,
}

/// A node in the workspace hierarchy.
///
/// `parent_id` is a weak reference to a category channel by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<ChannelId>,
    pub topic: Option<String>,
}

impl Channel {
    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }

    pub fn is_category(&self) -> bool {
        self.kind == ChannelKind::Category
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A channel creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<ChannelId>,
    pub topic: Option<String>,
}

impl NewChannel {
    pub fn top_level(name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            topic: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Direct,
    Group,
}

impl ConversationKind {
    pub fn from_is_group(is_group: bool) -> Self {
        if is_group {
            Self::Group
        } else {
            Self::Direct
        }
    }

    /// Name of the category that hosts channels of this kind.
    pub fn category_name(self) -> &'static str {
        match self {
            Self::Direct => DIRECT_MESSAGES_CATEGORY,
            Self::Group => GROUPS_CATEGORY,
        }
    }

    /// Reverse of [`category_name`](Self::category_name). `None` for
    /// unmanaged categories.
    pub fn from_category(name: &str) -> Option<Self> {
        match name {
            DIRECT_MESSAGES_CATEGORY => Some(Self::Direct),
            GROUPS_CATEGORY => Some(Self::Group),
            _ => None,
        }
    }
}

/// Name-based key binding a conversation to its hub channel.
///
/// The channel is named after `name`, lives under `kind.category_name()`, and
/// carries `name` in its topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub kind: ConversationKind,
}

impl IdentityKey {
    pub fn new(name: impl Into<String>, kind: ConversationKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn category_name(&self) -> &'static str {
        self.kind.category_name()
    }

    /// Value persisted in the channel topic.
    pub fn topic(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category_name(), self.name)
    }
}

/// A messaging-side chat, fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub name: String,
    pub kind: ConversationKind,
}

/// Content of a messaging-side message, classified once at the platform
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Sticker,
    Unknown,
}

impl MessageContent {
    /// Classify raw message fields.
    ///
    /// A non-empty body always wins; otherwise the media kind decides.
    pub fn from_parts(body: Option<&str>, media_kind: Option<&str>) -> Self {
        match (body, media_kind) {
            (Some(body), _) if !body.is_empty() => Self::Text(body.to_string()),
            (_, Some(kind)) if kind.eq_ignore_ascii_case("sticker") => Self::Sticker,
            _ => Self::Unknown,
        }
    }

    /// Text forwarded to the hub for this content.
    pub fn render(&self) -> &str {
        match self {
            Self::Text(body) => body,
            Self::Sticker => STICKER_PLACEHOLDER,
            Self::Unknown => UNKNOWN_PLACEHOLDER,
        }
    }
}

/// A message observed on the messaging side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_name: String,
    pub chat_id: ConversationId,
    /// Sent by the bridge's own account.
    pub is_self: bool,
    pub is_group: bool,
    pub content: MessageContent,
}

impl InboundMessage {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(
            self.sender_name.clone(),
            ConversationKind::from_is_group(self.is_group),
        )
    }
}

/// A message observed in a hub channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubMessage {
    pub author_is_bot: bool,
    /// Authored by the bridge's own user.
    pub author_is_bridge: bool,
    /// `None` for direct (non-workspace) contexts.
    pub workspace_id: Option<WorkspaceId>,
    pub channel_id: ChannelId,
    pub content: String,
}
