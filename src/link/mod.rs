//! Link manager
//!
//! Owns the wireless network association. The state machine itself is pure
//! (see [`state`]); this module provides the [`NetworkInterface`] seam, the
//! driver loop that applies events to the machine, and the host-side
//! interface implementation.
//!
//! The manager retries association forever: every disconnect event produces
//! exactly one new connect request, with no backoff and no retry limit, and
//! nothing is surfaced upward. Downstream (the session manager) is signalled
//! exactly once, on the first address assignment.

use crate::error::NodeResult;
use async_trait::async_trait;
use std::net::IpAddr;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

pub mod host;
pub mod state;

pub use host::HostNetwork;
pub use state::{transition, LinkAction, LinkEvent, LinkState};

/// Network association collaborator injected into the link manager.
///
/// `request_connect` issues one association request; completion and loss are
/// reported back asynchronously as [`LinkEvent`]s on the manager's channel.
#[async_trait]
pub trait NetworkInterface: Send + Sync {
    async fn request_connect(&self) -> NodeResult<()>;
}

/// Drives the link state machine from a stream of link events
pub struct LinkManager<N: NetworkInterface> {
    interface: N,
    events: mpsc::Receiver<LinkEvent>,
    // Taken on the first Connected entry; its absence afterwards is what
    // makes session start once-per-process.
    network_ready: Option<oneshot::Sender<IpAddr>>,
    state: LinkState,
}

impl<N: NetworkInterface> LinkManager<N> {
    pub fn new(
        interface: N,
        events: mpsc::Receiver<LinkEvent>,
        network_ready: oneshot::Sender<IpAddr>,
    ) -> Self {
        Self {
            interface,
            events,
            network_ready: Some(network_ready),
            state: LinkState::Disconnected,
        }
    }

    /// Current link state
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Run until the event channel closes. There is no terminal state; in
    /// production the channel stays open for the process lifetime.
    pub async fn run(mut self) {
        // Issue the first connect request immediately on process start
        self.apply(LinkEvent::AdapterStarted).await;

        while let Some(event) = self.events.recv().await {
            self.apply(event).await;
        }
        debug!("link event channel closed, link manager stopping");
    }

    /// Apply one event to the state machine and execute its side effect
    pub async fn apply(&mut self, event: LinkEvent) {
        let (next, action) = state::transition(&self.state, event);
        self.state = next;

        match action {
            Some(LinkAction::IssueConnect) => {
                if let Err(e) = self.interface.request_connect().await {
                    // Not escalated: the next disconnect event triggers
                    // another attempt, forever.
                    warn!(error = %e, "connect request failed");
                }
            }
            Some(LinkAction::NetworkReady(addr)) => match self.network_ready.take() {
                Some(ready_tx) => {
                    let _ = ready_tx.send(addr);
                }
                None => {
                    debug!(address = %addr, "network restored, session already started");
                }
            },
            None => {}
        }
    }
}
