//! Broker session manager
//!
//! Consumes [`SessionEvent`]s from the transport and executes the resulting
//! actions: a greeting publish on every establishment and a one-time start of
//! the telemetry publisher. Session losses and errors are recorded only;
//! reconnection is owned by the transport.

use crate::error::{NodeError, NodeResult};
use crate::sensor::SensorSource;
use crate::telemetry::TelemetryPublisher;
use crate::transport::{Publisher, QosLevel};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

pub mod events;

pub use events::{route_session_event, SessionAction, SessionEvent};

/// Topic the greeting is published to
pub const GREETING_TOPIC: &str = "/esp32/test";
/// Greeting payload announced on every session establishment
pub const GREETING_PAYLOAD: &str = "hi from esp32";

/// Reacts to broker session lifecycle events
pub struct SessionManager<P: Publisher + 'static> {
    publisher: Arc<P>,
    sensors: Arc<dyn SensorSource>,
    telemetry_period: Duration,
    shutdown: watch::Receiver<bool>,
    started: bool,
}

impl<P: Publisher + 'static> SessionManager<P> {
    pub fn new(
        publisher: Arc<P>,
        sensors: Arc<dyn SensorSource>,
        telemetry_period: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            publisher,
            sensors,
            telemetry_period,
            shutdown,
            started: false,
        }
    }

    /// Start the session observer task. May only be called once per manager;
    /// a second call fails with [`NodeError::SessionAlreadyStarted`].
    pub fn start(
        &mut self,
        mut events: mpsc::Receiver<SessionEvent>,
    ) -> NodeResult<JoinHandle<()>> {
        if self.started {
            return Err(NodeError::SessionAlreadyStarted);
        }
        self.started = true;

        let publisher = Arc::clone(&self.publisher);
        let sensors = Arc::clone(&self.sensors);
        let period = self.telemetry_period;
        let shutdown = self.shutdown.clone();
        // Survives reconnects: the publisher keeps running across session
        // losses and is never spawned a second time.
        let publisher_spawned = Arc::new(AtomicBool::new(false));

        Ok(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let running = publisher_spawned.load(Ordering::SeqCst);
                for action in route_session_event(&event, running) {
                    match action {
                        SessionAction::PublishGreeting => {
                            // Best effort; a failed greeting never blocks the
                            // telemetry start.
                            if let Err(e) = publisher
                                .publish(
                                    GREETING_TOPIC,
                                    GREETING_PAYLOAD.as_bytes().to_vec(),
                                    QosLevel::AtLeastOnce,
                                    false,
                                )
                                .await
                            {
                                debug!(error = %e, "greeting publish failed");
                            }
                        }
                        SessionAction::SpawnPublisher => {
                            if !publisher_spawned.swap(true, Ordering::SeqCst) {
                                let _ = TelemetryPublisher::spawn(
                                    Arc::clone(&publisher),
                                    Arc::clone(&sensors),
                                    period,
                                    shutdown.clone(),
                                );
                            }
                        }
                    }
                }
            }
            debug!("session event channel closed, session manager stopping");
        }))
    }
}
