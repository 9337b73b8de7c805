use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid sidecar frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not reach sidecar at {url} after {attempts} attempts")]
    Unreachable { url: String, attempts: u32 },

    /// The connection closed before the sidecar answered.
    #[error("sidecar connection closed")]
    Disconnected,

    #[error("sidecar error: {0}")]
    Sidecar(String),

    #[error("unexpected sidecar response to {request}")]
    UnexpectedResponse { request: &'static str },

    #[error("message to {chat_id} was not sent: {reason}")]
    SendFailed { chat_id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn into_bridge(self, context: &str) -> parley_bridge::Error {
        parley_bridge::Error::external(context, self)
    }
}
