//! Top-level error types for the sensor node
//!
//! Per-module errors (config, transport, sensors) convert into [`NodeError`]
//! at the bootstrap boundary. Recoverable conditions (link loss, session
//! loss, per-message publish failure) never surface here; they are handled
//! in place by retry or by skipping the message.

use thiserror::Error;

/// Main error type for sensor node operations
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Sensor initialization failed: {0}")]
    SensorInit(#[from] crate::sensor::SensorInitError),

    /// `SessionManager::start` was called a second time. The session is
    /// constructed at most once per process lifetime; re-entry is a caller
    /// error, not something to retry.
    #[error("Broker session already started")]
    SessionAlreadyStarted,

    #[error("Link monitor error: {message}")]
    Link { message: String },
}

impl NodeError {
    /// Create a link monitor error
    pub fn link<S: Into<String>>(message: S) -> Self {
        Self::Link {
            message: message.into(),
        }
    }
}

/// Result type for sensor node operations
pub type NodeResult<T> = Result<T, NodeError>;
