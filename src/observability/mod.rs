//! Observability
//!
//! Structured logging setup for the sensor node.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
