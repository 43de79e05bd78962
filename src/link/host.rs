//! Host-side network interface
//!
//! On a Pi the wireless association itself is owned by the OS supplicant
//! (wpa_supplicant / NetworkManager), so `request_connect` is a logged
//! delegation rather than a radio command. Link events are derived by a
//! monitor task that polls the kernel's operstate for the configured
//! interface and probes the locally assigned address with a connected UDP
//! socket (no packets are sent).

use crate::config::NetworkSection;
use crate::error::NodeResult;
use crate::link::{LinkEvent, NetworkInterface};
use async_trait::async_trait;
use std::net::{IpAddr, UdpSocket};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const OPERSTATE_POLL_PERIOD: Duration = Duration::from_secs(1);
const DEFAULT_PROBE_PORT: u16 = 1883;

pub struct HostNetwork {
    interface: String,
    ssid: String,
}

impl HostNetwork {
    pub fn new(config: &NetworkSection) -> Self {
        // The supplicant owns the secret; we only check that a configured
        // variable actually resolves so a misconfiguration shows up at
        // bootstrap instead of as silent association failures.
        if config.secret_env.is_some() && config.secret().is_none() {
            warn!(
                env = config.secret_env.as_deref().unwrap_or_default(),
                "wireless secret variable is named in the config but not set"
            );
        }
        Self {
            interface: config.interface.clone(),
            ssid: config.ssid.clone(),
        }
    }

    /// Spawn the operstate monitor that feeds the link manager.
    ///
    /// Emits [`LinkEvent::AddressAssigned`] when the interface transitions to
    /// `up` and an address probe succeeds, and [`LinkEvent::Disconnected`]
    /// when it goes back down. The task ends when the receiving side of
    /// `events` is dropped.
    pub fn spawn_monitor(
        interface: String,
        broker_url: String,
        events: mpsc::Sender<LinkEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (probe_host, probe_port) = match probe_target(&broker_url) {
                Some(target) => target,
                None => {
                    // Unreachable in practice: the broker URL is validated
                    // at startup before the monitor is spawned.
                    warn!(url = %broker_url, "broker URL has no host, link monitor stopping");
                    return;
                }
            };

            let mut was_up = false;
            let mut ticker = tokio::time::interval(OPERSTATE_POLL_PERIOD);

            loop {
                ticker.tick().await;
                let up = read_operstate(&interface)
                    .map(|state| state == "up")
                    .unwrap_or(false);

                if up && !was_up {
                    match probe_local_addr(&probe_host, probe_port).await {
                        Ok(addr) => {
                            debug!(interface = %interface, address = %addr, "interface up");
                            if events.send(LinkEvent::AddressAssigned(addr)).await.is_err() {
                                break;
                            }
                            was_up = true;
                        }
                        Err(e) => {
                            // Interface is up but routing isn't settled yet;
                            // retry on the next tick.
                            debug!(error = %e, "address probe failed");
                        }
                    }
                } else if !up && was_up {
                    debug!(interface = %interface, "interface down");
                    if events.send(LinkEvent::Disconnected).await.is_err() {
                        break;
                    }
                    was_up = false;
                }
            }
        })
    }
}

#[async_trait]
impl NetworkInterface for HostNetwork {
    async fn request_connect(&self) -> NodeResult<()> {
        // Association is owned by the OS supplicant; the request is recorded
        // so the connect-per-disconnect cadence is visible in the logs.
        info!(
            interface = %self.interface,
            ssid = %self.ssid,
            "requesting network association"
        );
        Ok(())
    }
}

fn operstate_path(interface: &str) -> PathBuf {
    PathBuf::from("/sys/class/net").join(interface).join("operstate")
}

fn read_operstate(interface: &str) -> std::io::Result<String> {
    let raw = std::fs::read_to_string(operstate_path(interface))?;
    Ok(raw.trim().to_string())
}

/// Host and port the address probe aims at, taken from the broker URL
fn probe_target(broker_url: &str) -> Option<(String, u16)> {
    let url = Url::parse(broker_url).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port().unwrap_or(DEFAULT_PROBE_PORT);
    Some((host, port))
}

/// Determine the local address the kernel would use to reach the broker.
/// Resolution is async so a hostname never blocks the monitor loop;
/// connecting a UDP socket only selects a route, nothing is transmitted.
async fn probe_local_addr(host: &str, port: u16) -> std::io::Result<IpAddr> {
    let target = tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "broker host has no addresses")
        })?;

    let bind_addr = if target.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
    let socket = UdpSocket::bind(bind_addr)?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}
