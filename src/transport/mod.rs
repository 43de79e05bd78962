//! Publish transport for telemetry
//!
//! This module provides the publish abstraction the session and telemetry
//! layers are written against, plus the rumqttc-backed implementation. The
//! seam exists so the state machines can be exercised against a mock
//! without a broker.

use async_trait::async_trait;
use thiserror::Error;

pub mod mqtt;

/// Delivery guarantee level for a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosLevel {
    /// At most once (fire and forget)
    AtMostOnce,
    /// At least once (acknowledged)
    AtLeastOnce,
    /// Exactly once
    ExactlyOnce,
}

/// Transport errors surfaced by publish and session construction
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The session handle exists but the transport is in a transient
    /// disconnected state. Publish attempts fail cleanly; the caller decides
    /// whether that matters.
    #[error("Not connected to broker")]
    NotConnected,
}

/// Publish interface exposed by the broker session.
///
/// Fire-and-forget from the telemetry task's point of view: the task never
/// consults the result beyond logging it.
#[async_trait]
pub trait Publisher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish one message to a topic
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), Self::Error>;

    /// Whether the underlying session is currently established
    fn is_connected(&self) -> bool;
}
