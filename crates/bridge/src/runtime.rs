//! Startup ordering and the two event-handling loops.
//!
//! GuildGuard → StructureSynchronizer → both relays. Events that queue up on
//! the receivers before activation are handled only once activation is done.

use std::{sync::Arc, time::Duration};

use {
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    ChannelDirectory, Error, HubClient, HubEvent, MessagingClient, MessagingEvent, Result,
    error::with_timeout,
    guard::ensure_single_workspace,
    inbound::InboundRelay,
    outbound::OutboundRelay,
    structure::StructureSynchronizer,
    types::{HubMessage, InboundMessage, Workspace},
};

/// Default deadline for a single platform round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub request_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Everything the relays share once the bridge is active.
pub struct BridgeContext {
    /// The one workspace that passed the guard.
    pub workspace: Workspace,
    pub hub: Arc<dyn HubClient>,
    pub messaging: Arc<dyn MessagingClient>,
    pub directory: ChannelDirectory,
    pub timeout: Duration,
}

impl BridgeContext {
    pub fn new(
        workspace: Workspace,
        hub: Arc<dyn HubClient>,
        messaging: Arc<dyn MessagingClient>,
        timeout: Duration,
    ) -> Self {
        Self {
            directory: ChannelDirectory::new(Arc::clone(&hub), timeout),
            workspace,
            hub,
            messaging,
            timeout,
        }
    }
}

/// A bridge that has not been activated yet.
pub struct Bridge {
    hub: Arc<dyn HubClient>,
    messaging: Arc<dyn MessagingClient>,
    settings: BridgeSettings,
}

impl Bridge {
    pub fn new(
        hub: Arc<dyn HubClient>,
        messaging: Arc<dyn MessagingClient>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            hub,
            messaging,
            settings,
        }
    }

    /// Validate the workspace set and build the scaffolding.
    ///
    /// Any error returned here is fatal: no relay may run.
    pub async fn activate(&self, workspaces: &[Workspace]) -> Result<ActiveBridge> {
        let workspace = ensure_single_workspace(workspaces)?;

        StructureSynchronizer::new(Arc::clone(&self.hub), self.settings.request_timeout)
            .sync(&workspace)
            .await?;

        let ctx = Arc::new(BridgeContext::new(
            workspace,
            Arc::clone(&self.hub),
            Arc::clone(&self.messaging),
            self.settings.request_timeout,
        ));
        info!(workspace = %ctx.workspace.name, "bridge active");

        Ok(ActiveBridge {
            inbound: Arc::new(InboundRelay::new(Arc::clone(&ctx))),
            outbound: Arc::new(OutboundRelay::new(Arc::clone(&ctx))),
            ctx,
        })
    }

    /// Workspaces to check at activation.
    ///
    /// A ready event without any workspace is cross-checked against the hub's
    /// own listing before the guard rejects it.
    async fn ready_workspaces(&self, reported: Vec<Workspace>) -> Result<Vec<Workspace>> {
        if !reported.is_empty() {
            return Ok(reported);
        }
        let listed = with_timeout(
            "list workspaces",
            self.settings.request_timeout,
            self.hub.workspaces(),
        )
        .await?;
        debug!(count = listed.len(), "ready event carried no workspace, asked the hub");
        Ok(listed)
    }

    /// Wait for the hub to report ready, activate, then relay until shutdown.
    ///
    /// Hub messages seen before the first ready event are dropped. Messaging
    /// events stay queued until activation completes.
    pub async fn run_until_ready(
        self,
        mut hub_events: mpsc::Receiver<HubEvent>,
        messaging_events: mpsc::Receiver<MessagingEvent>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let workspaces = loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                event = hub_events.recv() => match event {
                    Some(HubEvent::Ready { workspaces }) => break workspaces,
                    Some(HubEvent::MessageCreated(msg)) => {
                        debug!(channel = %msg.channel_id, "hub message before ready, dropping");
                    },
                    None => return Err(Error::StreamClosed { stream: "hub" }),
                },
            }
        };

        let activated = async {
            let workspaces = self.ready_workspaces(workspaces).await?;
            self.activate(&workspaces).await
        };
        let active = match activated.await {
            Ok(active) => active,
            Err(e) => {
                error!(error = %e, "bridge activation failed");
                return Err(e);
            },
        };
        active.run(hub_events, messaging_events, shutdown).await;
        Ok(())
    }
}

/// A bridge whose structure is in place and whose relays may run.
pub struct ActiveBridge {
    ctx: Arc<BridgeContext>,
    inbound: Arc<InboundRelay>,
    outbound: Arc<OutboundRelay>,
}

impl ActiveBridge {
    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.ctx
    }

    pub fn inbound(&self) -> &InboundRelay {
        &self.inbound
    }

    pub fn outbound(&self) -> &OutboundRelay {
        &self.outbound
    }

    /// Consume both event streams until shutdown or until both close.
    ///
    /// Each stream is handled by its own task, one event at a time. Per-event
    /// failures are logged and never stop the loop.
    pub async fn run(
        self,
        mut hub_events: mpsc::Receiver<HubEvent>,
        mut messaging_events: mpsc::Receiver<MessagingEvent>,
        shutdown: CancellationToken,
    ) {
        let inbound = Arc::clone(&self.inbound);
        let inbound_shutdown = shutdown.clone();
        let inbound_task = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = inbound_shutdown.cancelled() => break,
                    event = messaging_events.recv() => event,
                };
                match event {
                    Some(MessagingEvent::Message(msg)) => relay_inbound(&inbound, &msg).await,
                    Some(MessagingEvent::Connected) => info!("messaging session connected"),
                    Some(MessagingEvent::Disconnected { reason }) => {
                        warn!(reason, "messaging session disconnected");
                    },
                    None => {
                        warn!("messaging event stream closed");
                        break;
                    },
                }
            }
        });

        let outbound = Arc::clone(&self.outbound);
        let outbound_shutdown = shutdown.clone();
        let outbound_task = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = outbound_shutdown.cancelled() => break,
                    event = hub_events.recv() => event,
                };
                match event {
                    Some(HubEvent::MessageCreated(msg)) => relay_outbound(&outbound, &msg).await,
                    Some(HubEvent::Ready { workspaces }) => {
                        debug!(guilds = workspaces.len(), "hub session resumed");
                    },
                    None => {
                        warn!("hub event stream closed");
                        break;
                    },
                }
            }
        });

        let (inbound_result, outbound_result) = tokio::join!(inbound_task, outbound_task);
        for result in [inbound_result, outbound_result] {
            if let Err(e) = result {
                error!(error = %e, "relay task panicked");
            }
        }
        info!(workspace = %self.ctx.workspace.name, "bridge stopped");
    }
}

async fn relay_inbound(relay: &InboundRelay, msg: &InboundMessage) {
    if let Err(e) = relay.handle(msg).await {
        warn!(
            sender = %msg.sender_name,
            chat = %msg.chat_id,
            error = %e,
            "failed to relay chat message to hub"
        );
    }
}

async fn relay_outbound(relay: &OutboundRelay, msg: &HubMessage) {
    match relay.handle(msg).await {
        Ok(_) => {},
        Err(Error::ConversationNotFound { name }) => {
            warn!(channel = %msg.channel_id, target = %name, "target conversation not found");
        },
        Err(e) => {
            warn!(channel = %msg.channel_id, error = %e, "failed to relay hub message to chat");
        },
    }
}
