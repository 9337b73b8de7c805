//! WebSocket connection to the WhatsApp Web sidecar.
//!
//! One background task owns the socket. Requests carry a `request_id` and
//! are answered through a oneshot; every other frame goes to the frame
//! channel in arrival order.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    dashmap::DashMap,
    futures::{SinkExt, StreamExt},
    tokio::sync::{mpsc, oneshot},
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
    tracing::{debug, info, warn},
    uuid::Uuid,
};

use crate::{
    error::{Error, Result},
    types::{GatewayMessage, SidecarMessage},
};

/// Connection attempts before giving up on the sidecar.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;

const RETRY_DELAY: Duration = Duration::from_millis(500);

type Pending = Arc<DashMap<String, oneshot::Sender<SidecarMessage>>>;
type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Handle to a live sidecar connection.
pub struct SidecarHandle {
    write_tx: mpsc::UnboundedSender<String>,
    pending: Pending,
    connected: Arc<AtomicBool>,
}

impl SidecarHandle {
    /// Connect once. Unsolicited frames are delivered to `frames`.
    pub async fn connect(url: &str, frames: mpsc::Sender<SidecarMessage>) -> Result<Self> {
        let (socket, _response) = connect_async(url).await?;
        info!(url, "connected to whatsapp sidecar");

        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let pending: Pending = Arc::new(DashMap::new());
        let connected = Arc::new(AtomicBool::new(true));

        tokio::spawn(run_connection(
            socket,
            write_rx,
            Arc::clone(&pending),
            frames,
            Arc::clone(&connected),
        ));

        Ok(Self {
            write_tx,
            pending,
            connected,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a frame without waiting for an answer.
    pub fn send(&self, msg: &GatewayMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.write_tx.send(json).map_err(|_| Error::Disconnected)
    }

    /// Send a request and wait for the frame carrying the same `request_id`.
    ///
    /// Dropping the returned future forgets the request; a late answer is
    /// then delivered to the frame channel like any other frame.
    pub async fn request(
        &self,
        build: impl FnOnce(String) -> GatewayMessage,
    ) -> Result<SidecarMessage> {
        if !self.is_connected() {
            return Err(Error::Disconnected);
        }
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request_id.clone(), tx);
        let _guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            request_id: request_id.clone(),
        };

        self.send(&build(request_id))?;
        rx.await.map_err(|_| Error::Disconnected)
    }
}

struct PendingGuard {
    pending: Pending,
    request_id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove(&self.request_id);
    }
}

/// Connect, retrying while the sidecar is still starting up.
pub async fn connect_with_retry(
    url: &str,
    frames: mpsc::Sender<SidecarMessage>,
    attempts: u32,
) -> Result<SidecarHandle> {
    for attempt in 1..=attempts {
        match SidecarHandle::connect(url, frames.clone()).await {
            Ok(handle) => return Ok(handle),
            Err(e) => {
                debug!(url, attempt, error = %e, "sidecar not reachable yet");
                if attempt < attempts {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            },
        }
    }
    Err(Error::Unreachable {
        url: url.to_string(),
        attempts,
    })
}

async fn run_connection(
    socket: Socket,
    mut write_rx: mpsc::UnboundedReceiver<String>,
    pending: Pending,
    frames: mpsc::Sender<SidecarMessage>,
    connected: Arc<AtomicBool>,
) {
    let (mut sink, mut reader) = socket.split();

    let reason = loop {
        tokio::select! {
            msg = reader.next() => match msg {
                Some(Ok(Message::Text(text))) => route(&text, &pending, &frames).await,
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = sink.send(Message::Pong(data)).await {
                        break e.to_string();
                    }
                },
                Some(Ok(Message::Close(_))) | None => break "sidecar closed the connection".to_string(),
                Some(Ok(_)) => {},
                Some(Err(e)) => break e.to_string(),
            },
            json = write_rx.recv() => match json {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        break e.to_string();
                    }
                },
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break "bridge closed the connection".to_string();
                },
            },
        }
    };

    warn!(reason = %reason, "whatsapp sidecar connection ended");
    connected.store(false, Ordering::SeqCst);
    // Dropping the senders fails every in-flight request.
    pending.clear();
    let _ = frames.send(SidecarMessage::Disconnected { reason }).await;
}

async fn route(text: &str, pending: &Pending, frames: &mpsc::Sender<SidecarMessage>) {
    let msg: SidecarMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "ignoring unparseable sidecar frame");
            return;
        },
    };

    let waiter = msg
        .request_id()
        .and_then(|id| pending.remove(id))
        .map(|(_, tx)| tx);
    match waiter {
        Some(tx) => {
            let _ = tx.send(msg);
        },
        None => {
            if frames.send(msg).await.is_err() {
                debug!("no listener for sidecar frames");
            }
        },
    }
}
