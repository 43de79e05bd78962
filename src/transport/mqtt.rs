//! rumqttc-backed broker session
//!
//! [`MqttSession`] is the single session handle of the process: it is created
//! once, when the network first comes up, and never recreated. Reconnection
//! after session loss is transport-level — the poll loop keeps polling the
//! same event loop, which re-establishes the connection on its own. Session
//! lifecycle events are surfaced to the session manager as
//! [`SessionEvent`]s on an mpsc channel.

use super::{Publisher, QosLevel, TransportError};
use crate::config::MqttSection;
use crate::session::SessionEvent;
use async_trait::async_trait;
use rumqttc::v5::mqttbytes::v5::Packet;
use rumqttc::v5::{mqttbytes::QoS, AsyncClient, Event};
use rumqttc::Transport as RumqttcTransport;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

/// Delay before re-polling after a connection error. The event loop retries
/// forever; there is no attempt limit.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the session event channel
const EVENT_CHANNEL_CAPACITY: usize = 16;

impl From<QosLevel> for QoS {
    fn from(level: QosLevel) -> Self {
        match level {
            QosLevel::AtMostOnce => QoS::AtMostOnce,
            QosLevel::AtLeastOnce => QoS::AtLeastOnce,
            QosLevel::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

/// Build MQTT options from config (pure apart from env/clock reads)
pub fn configure_mqtt_options(
    node_id: &str,
    config: &MqttSection,
) -> Result<rumqttc::v5::MqttOptions, TransportError> {
    let url = Url::parse(&config.broker_url)
        .map_err(|_| TransportError::InvalidBrokerUrl(config.broker_url.clone()))?;

    let host = url
        .host_str()
        .ok_or_else(|| TransportError::InvalidBrokerUrl(config.broker_url.clone()))?;
    let port = url
        .port()
        .unwrap_or(if url.scheme() == "mqtts" { 8883 } else { 1883 });

    // Unique client id per connection attempt to prevent broker conflicts
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let client_id = format!("sensornode-{node_id}-{timestamp}");
    let mut mqtt_options = rumqttc::v5::MqttOptions::new(client_id, host, port);

    if url.scheme() == "mqtts" {
        mqtt_options.set_transport(RumqttcTransport::tls_with_default_config());
    }

    if let Some(username) = config.username() {
        let password = config.password().unwrap_or_default();
        mqtt_options.set_credentials(username, password);
    }

    mqtt_options.set_keep_alive(Duration::from_secs(60));

    Ok(mqtt_options)
}

/// Map an MQTT event to a session lifecycle event (pure routing decision).
/// Infrastructure packets (PingResp, acks for our own publishes) carry no
/// lifecycle meaning and map to None.
pub fn route_event(event: &Event) -> Option<SessionEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Some(SessionEvent::Established),
        Event::Incoming(Packet::Disconnect(disconnect)) => Some(SessionEvent::Lost(format!(
            "broker disconnect: {:?}",
            disconnect.reason_code
        ))),
        _ => None,
    }
}

/// The single broker session handle
pub struct MqttSession {
    client: AsyncClient,
    connected: watch::Receiver<bool>,
    event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttSession {
    /// Construct the session, spawn its poll loop and initiate connection.
    ///
    /// Returns the handle plus the receiving end of the session event
    /// channel; the session manager consumes the events.
    pub fn connect(
        node_id: &str,
        config: &MqttSection,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>), TransportError> {
        let mqtt_options = configure_mqtt_options(node_id, config)?;
        let (client, mut event_loop) = AsyncClient::new(mqtt_options, 10);

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (connected_tx, connected_rx) = watch::channel(false);

        let broker_url = config.broker_url.clone();
        let handle = tokio::spawn(async move {
            info!(broker = %broker_url, "MQTT event loop started");
            loop {
                match event_loop.poll().await {
                    Ok(event) => {
                        match &event {
                            Event::Incoming(Packet::ConnAck(_)) => {
                                let _ = connected_tx.send(true);
                            }
                            Event::Incoming(Packet::Disconnect(_)) => {
                                let _ = connected_tx.send(false);
                            }
                            _ => {}
                        }
                        if let Some(session_event) = route_event(&event) {
                            if event_tx.send(session_event).await.is_err() {
                                debug!("session event channel closed, stopping event loop");
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = connected_tx.send(false);
                        if event_tx
                            .send(SessionEvent::Error(e.to_string()))
                            .await
                            .is_err()
                        {
                            debug!("session event channel closed, stopping event loop");
                            break;
                        }
                        // Keep polling; rumqttc re-establishes the connection
                        // on the next poll after the delay.
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        Ok((
            Self {
                client,
                connected: connected_rx,
                event_loop_handle: Some(handle),
            },
            event_rx,
        ))
    }
}

#[async_trait]
impl Publisher for MqttSession {
    type Error = TransportError;

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), Self::Error> {
        if !*self.connected.borrow() {
            return Err(TransportError::NotConnected);
        }

        self.client
            .publish(topic, qos.into(), retain, payload)
            .await
            .map_err(|e| TransportError::PublishFailed(Box::new(e)))
    }

    fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }
}

impl Drop for MqttSession {
    fn drop(&mut self) {
        // The poll loop has no async shutdown path; abort it with the handle.
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mqtt_config() -> MqttSection {
        MqttSection {
            broker_url: "mqtt://localhost:1883".to_string(),
            username_env: None,
            password_env: None,
        }
    }

    #[test]
    fn test_configure_mqtt_options() {
        let config = test_mqtt_config();
        let options = configure_mqtt_options("test-node", &config);
        assert!(options.is_ok());
    }

    #[test]
    fn test_invalid_broker_url() {
        let mut config = test_mqtt_config();
        config.broker_url = "not a url".to_string();

        let result = configure_mqtt_options("test-node", &config);
        assert!(matches!(
            result,
            Err(TransportError::InvalidBrokerUrl(_))
        ));
    }

    #[test]
    fn test_credentials_resolved_through_config() {
        std::env::set_var("SENSORNODE_TEST_BROKER_USER", "broker-user");
        let mut config = test_mqtt_config();
        config.username_env = Some("SENSORNODE_TEST_BROKER_USER".to_string());

        // Username resolves via the config getters; a missing password
        // variable falls back to empty rather than failing.
        assert!(configure_mqtt_options("test-node", &config).is_ok());
        std::env::remove_var("SENSORNODE_TEST_BROKER_USER");
    }

    #[test]
    fn test_default_port_for_scheme() {
        let mut config = test_mqtt_config();
        config.broker_url = "mqtt://broker.local".to_string();
        assert!(configure_mqtt_options("n", &config).is_ok());

        config.broker_url = "mqtts://broker.local".to_string();
        assert!(configure_mqtt_options("n", &config).is_ok());
    }

    #[test]
    fn test_route_event_connack() {
        use rumqttc::v5::mqttbytes::v5::{ConnAck, ConnectReturnCode};

        let connack = Event::Incoming(Packet::ConnAck(ConnAck {
            session_present: false,
            code: ConnectReturnCode::Success,
            properties: None,
        }));
        assert!(matches!(
            route_event(&connack),
            Some(SessionEvent::Established)
        ));
    }

    #[test]
    fn test_route_event_disconnect() {
        use rumqttc::v5::mqttbytes::v5::{Disconnect, DisconnectReasonCode};

        let disconnect = Event::Incoming(Packet::Disconnect(Disconnect {
            reason_code: DisconnectReasonCode::NormalDisconnection,
            properties: None,
        }));
        assert!(matches!(route_event(&disconnect), Some(SessionEvent::Lost(_))));
    }

    #[test]
    fn test_route_event_ignores_infrastructure() {
        let pingresp = Event::Incoming(Packet::PingResp(
            rumqttc::v5::mqttbytes::v5::PingResp,
        ));
        assert!(route_event(&pingresp).is_none());

        let outgoing = Event::Outgoing(rumqttc::Outgoing::PingReq);
        assert!(route_event(&outgoing).is_none());
    }

    #[tokio::test]
    async fn test_publish_fails_before_connection() {
        let config = test_mqtt_config();
        let (session, _events) = MqttSession::connect("test-node", &config).unwrap();

        let result = session
            .publish("/esp32/test", b"hi".to_vec(), QosLevel::AtLeastOnce, false)
            .await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_qos_level_mapping() {
        assert_eq!(QoS::from(QosLevel::AtMostOnce), QoS::AtMostOnce);
        assert_eq!(QoS::from(QosLevel::AtLeastOnce), QoS::AtLeastOnce);
        assert_eq!(QoS::from(QosLevel::ExactlyOnce), QoS::ExactlyOnce);
    }
}
