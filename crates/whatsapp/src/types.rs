//! Wire protocol between the bridge and the WhatsApp Web sidecar.
//!
//! Every frame is a JSON object tagged by `type`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Frames sent to the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayMessage {
    /// Open (or resume) a session, pairing by QR code if needed.
    Login {
        session: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        auth_dir: Option<PathBuf>,
    },
    ListChats {
        request_id: String,
    },
    SendText {
        request_id: String,
        chat_id: String,
        text: String,
    },
}

/// One chat as reported by the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
}

/// Frames received from the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SidecarMessage {
    /// Pairing QR code, to be scanned from the phone.
    Qr {
        qr: String,
    },
    Connected {
        #[serde(default)]
        phone_number: Option<String>,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    InboundMessage {
        chat_id: String,
        #[serde(default)]
        sender_name: Option<String>,
        #[serde(default)]
        is_from_me: bool,
        #[serde(default)]
        is_group: bool,
        #[serde(default)]
        body: Option<String>,
        /// `"sticker"`, `"image"`, ... for media messages.
        #[serde(default)]
        media_type: Option<String>,
    },
    Chats {
        request_id: String,
        chats: Vec<ChatSummary>,
    },
    SendResult {
        request_id: String,
        success: bool,
        #[serde(default)]
        error: Option<String>,
    },
    Error {
        #[serde(default)]
        request_id: Option<String>,
        error: String,
    },
}

impl SidecarMessage {
    /// Correlation id when this frame answers a request.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Chats { request_id, .. } | Self::SendResult { request_id, .. } => {
                Some(request_id)
            },
            Self::Error { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn login_omits_missing_auth_dir() {
        let frame = serde_json::to_value(GatewayMessage::Login {
            session: "main".into(),
            auth_dir: None,
        })
        .unwrap();
        assert_eq!(frame, json!({"type": "login", "session": "main"}));
    }

    #[test]
    fn send_text_shape() {
        let frame = serde_json::to_value(GatewayMessage::SendText {
            request_id: "r1".into(),
            chat_id: "123@c.us".into(),
            text: "hi".into(),
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({"type": "send_text", "request_id": "r1", "chat_id": "123@c.us", "text": "hi"})
        );
    }

    #[test]
    fn inbound_text_message() {
        let msg: SidecarMessage = serde_json::from_value(json!({
            "type": "inbound_message",
            "chat_id": "123@c.us",
            "sender_name": "Alice",
            "is_from_me": false,
            "is_group": false,
            "body": "hello",
        }))
        .unwrap();
        let SidecarMessage::InboundMessage {
            sender_name,
            body,
            media_type,
            ..
        } = msg
        else {
            panic!("wrong variant");
        };
        assert_eq!(sender_name.as_deref(), Some("Alice"));
        assert_eq!(body.as_deref(), Some("hello"));
        assert!(media_type.is_none());
    }

    #[test]
    fn sticker_without_body() {
        let msg: SidecarMessage = serde_json::from_str(
            r#"{"type":"inbound_message","chat_id":"g@g.us","is_group":true,"media_type":"sticker"}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            SidecarMessage::InboundMessage {
                is_group: true,
                body: None,
                ..
            }
        ));
    }

    #[test]
    fn chats_response_is_correlated() {
        let msg: SidecarMessage = serde_json::from_value(json!({
            "type": "chats",
            "request_id": "abc",
            "chats": [{"id": "1@c.us", "name": "Alice"}, {"id": "2@g.us", "is_group": true}],
        }))
        .unwrap();
        assert_eq!(msg.request_id(), Some("abc"));
        let SidecarMessage::Chats { chats, .. } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(chats[1].name, None);
        assert!(chats[1].is_group);
    }

    #[test]
    fn uncorrelated_frames() {
        let qr: SidecarMessage = serde_json::from_str(r#"{"type":"qr","qr":"2@abc"}"#).unwrap();
        assert_eq!(qr.request_id(), None);
        let err: SidecarMessage =
            serde_json::from_str(r#"{"type":"error","error":"boom"}"#).unwrap();
        assert_eq!(err.request_id(), None);
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        assert!(serde_json::from_str::<SidecarMessage>(r#"{"type":"presence"}"#).is_err());
    }
}
