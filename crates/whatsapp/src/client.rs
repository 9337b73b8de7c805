//! [`MessagingClient`] over the sidecar connection.

use {
    async_trait::async_trait,
    parley_bridge::{
        Conversation, ConversationId, ConversationKind, InboundMessage, MessageContent,
        MessagingClient, MessagingEvent,
    },
    parley_config::WhatsAppConfig,
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    sidecar::{DEFAULT_CONNECT_ATTEMPTS, SidecarHandle, connect_with_retry},
    types::{ChatSummary, GatewayMessage, SidecarMessage},
};

const FRAME_BUFFER: usize = 256;

pub struct WhatsAppClient {
    sidecar: SidecarHandle,
}

impl WhatsAppClient {
    pub fn new(sidecar: SidecarHandle) -> Self {
        Self { sidecar }
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let reply = self
            .sidecar
            .request(|request_id| GatewayMessage::ListChats { request_id })
            .await?;
        match reply {
            SidecarMessage::Chats { chats, .. } => Ok(chats),
            SidecarMessage::Error { error, .. } => Err(Error::Sidecar(error)),
            _ => Err(Error::UnexpectedResponse {
                request: "list_chats",
            }),
        }
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let reply = self
            .sidecar
            .request(|request_id| GatewayMessage::SendText {
                request_id,
                chat_id: chat_id.to_string(),
                text: text.to_string(),
            })
            .await?;
        match reply {
            SidecarMessage::SendResult { success: true, .. } => Ok(()),
            SidecarMessage::SendResult { error, .. } => Err(Error::SendFailed {
                chat_id: chat_id.to_string(),
                reason: error.unwrap_or_else(|| "rejected by sidecar".into()),
            }),
            SidecarMessage::Error { error, .. } => Err(Error::SendFailed {
                chat_id: chat_id.to_string(),
                reason: error,
            }),
            _ => Err(Error::UnexpectedResponse {
                request: "send_text",
            }),
        }
    }
}

#[async_trait]
impl MessagingClient for WhatsAppClient {
    async fn conversations(&self) -> parley_bridge::Result<Vec<Conversation>> {
        let chats = self
            .list_chats()
            .await
            .map_err(|e| e.into_bridge("list whatsapp chats"))?;
        Ok(chats.into_iter().map(to_conversation).collect())
    }

    async fn send_text(&self, conversation: &ConversationId, text: &str) -> parley_bridge::Result<()> {
        self.send(conversation.as_str(), text)
            .await
            .map_err(|e| e.into_bridge("send whatsapp message"))
    }
}

/// Connect to the sidecar, start the session, and stream its events.
pub async fn start(
    config: &WhatsAppConfig,
    events: mpsc::Sender<MessagingEvent>,
) -> Result<WhatsAppClient> {
    let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);
    let sidecar =
        connect_with_retry(&config.sidecar_url, frames_tx, DEFAULT_CONNECT_ATTEMPTS).await?;
    tokio::spawn(forward_events(frames_rx, events));

    sidecar.send(&GatewayMessage::Login {
        session: config.session.clone(),
        auth_dir: config.auth_dir.clone(),
    })?;
    info!(session = %config.session, "whatsapp login requested");

    Ok(WhatsAppClient::new(sidecar))
}

async fn forward_events(
    mut frames: mpsc::Receiver<SidecarMessage>,
    events: mpsc::Sender<MessagingEvent>,
) {
    while let Some(frame) = frames.recv().await {
        let Some(event) = to_event(frame) else {
            continue;
        };
        if events.send(event).await.is_err() {
            debug!("bridge stopped listening; dropping whatsapp events");
            break;
        }
    }
}

/// Map an unsolicited sidecar frame to a bridge event, if it is one.
pub fn to_event(frame: SidecarMessage) -> Option<MessagingEvent> {
    match frame {
        SidecarMessage::Qr { qr } => {
            info!(qr = %qr, "whatsapp pairing required; scan the QR code with your phone");
            None
        },
        SidecarMessage::Connected { phone_number } => {
            info!(?phone_number, "whatsapp web connected");
            Some(MessagingEvent::Connected)
        },
        SidecarMessage::Disconnected { reason } => Some(MessagingEvent::Disconnected { reason }),
        SidecarMessage::InboundMessage {
            chat_id,
            sender_name,
            is_from_me,
            is_group,
            body,
            media_type,
        } => {
            let content = MessageContent::from_parts(body.as_deref(), media_type.as_deref());
            let sender_name = sender_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| chat_id.clone());
            Some(MessagingEvent::Message(InboundMessage {
                sender_name,
                chat_id: ConversationId::new(chat_id),
                is_self: is_from_me,
                is_group,
                content,
            }))
        },
        SidecarMessage::Error { error, .. } => {
            warn!(error = %error, "whatsapp sidecar error");
            None
        },
        SidecarMessage::Chats { request_id, .. } | SidecarMessage::SendResult { request_id, .. } => {
            debug!(request_id = %request_id, "late sidecar response, ignoring");
            None
        },
    }
}

fn to_conversation(chat: ChatSummary) -> Conversation {
    Conversation {
        name: chat.name.filter(|n| !n.is_empty()).unwrap_or_else(|| chat.id.clone()),
        kind: ConversationKind::from_is_group(chat.is_group),
        id: ConversationId::new(chat.id),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::sidecar::tests::fake_sidecar,
        rstest::rstest,
    };

    fn inbound(
        sender_name: Option<&str>,
        is_from_me: bool,
        body: Option<&str>,
        media_type: Option<&str>,
    ) -> SidecarMessage {
        SidecarMessage::InboundMessage {
            chat_id: "1@c.us".into(),
            sender_name: sender_name.map(Into::into),
            is_from_me,
            is_group: false,
            body: body.map(Into::into),
            media_type: media_type.map(Into::into),
        }
    }

    #[rstest]
    #[case(Some("hi"), None, MessageContent::Text("hi".into()))]
    #[case(None, Some("sticker"), MessageContent::Sticker)]
    #[case(Some(""), Some("sticker"), MessageContent::Sticker)]
    #[case(None, Some("image"), MessageContent::Unknown)]
    #[case(None, None, MessageContent::Unknown)]
    fn inbound_content_is_classified(
        #[case] body: Option<&str>,
        #[case] media_type: Option<&str>,
        #[case] expected: MessageContent,
    ) {
        let Some(MessagingEvent::Message(msg)) = to_event(inbound(Some("Alice"), false, body, media_type))
        else {
            panic!("expected a message event");
        };
        assert_eq!(msg.content, expected);
    }

    #[test]
    fn own_messages_are_marked_self() {
        let Some(MessagingEvent::Message(msg)) = to_event(inbound(Some("Me"), true, Some("x"), None))
        else {
            panic!("expected a message event");
        };
        assert!(msg.is_self);
    }

    #[test]
    fn missing_sender_name_falls_back_to_chat_id() {
        let Some(MessagingEvent::Message(msg)) = to_event(inbound(None, false, Some("x"), None))
        else {
            panic!("expected a message event");
        };
        assert_eq!(msg.sender_name, "1@c.us");
    }

    #[test]
    fn qr_and_errors_are_not_events() {
        assert!(to_event(SidecarMessage::Qr { qr: "q".into() }).is_none());
        assert!(
            to_event(SidecarMessage::Error {
                request_id: None,
                error: "boom".into(),
            })
            .is_none()
        );
    }

    #[test]
    fn connection_state_events() {
        assert!(matches!(
            to_event(SidecarMessage::Connected { phone_number: None }),
            Some(MessagingEvent::Connected)
        ));
        assert!(matches!(
            to_event(SidecarMessage::Disconnected {
                reason: "logged out".into()
            }),
            Some(MessagingEvent::Disconnected { reason }) if reason == "logged out"
        ));
    }

    #[test]
    fn unnamed_chats_use_their_id() {
        let conversation = to_conversation(ChatSummary {
            id: "2@g.us".into(),
            name: None,
            is_group: true,
        });
        assert_eq!(conversation.name, "2@g.us");
        assert_eq!(conversation.kind, ConversationKind::Group);
    }

    #[tokio::test]
    async fn lists_conversations_and_sends_through_the_sidecar() {
        let url = fake_sidecar(None).await;
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let config = WhatsAppConfig {
            sidecar_url: url,
            ..Default::default()
        };

        let client = start(&config, events_tx).await.unwrap();
        assert!(matches!(
            events_rx.recv().await.unwrap(),
            MessagingEvent::Connected
        ));

        let conversations = client.conversations().await.unwrap();
        assert_eq!(conversations, vec![Conversation {
            id: ConversationId::new("1@c.us"),
            name: "Alice".into(),
            kind: ConversationKind::Direct,
        }]);

        client
            .send_text(&ConversationId::new("1@c.us"), "hello")
            .await
            .unwrap();
        let err = client
            .send_text(&ConversationId::new("blocked@c.us"), "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }
}
