//! sensornode - Connected sensor node
//!
//! Reads four digital inputs and two analog channels and streams them to an
//! MQTT broker at a fixed cadence, recovering automatically from network and
//! session loss. The crate is organised around three state machines:
//!
//! - [`link::LinkManager`] keeps the device associated with the configured
//!   network and signals downstream once an address is assigned
//! - [`session::SessionManager`] owns the single broker session and gates the
//!   telemetry task on session establishment
//! - [`telemetry::TelemetryPublisher`] is the recurring task that samples the
//!   sensors and publishes one message per channel
//!
//! Sensor acquisition, credentials and bootstrap are external collaborators
//! behind the [`sensor::SensorSource`] trait, [`config::NodeConfig`] and the
//! binary entry point respectively.

pub mod config;
pub mod error;
pub mod link;
pub mod observability;
pub mod sensor;
pub mod session;
pub mod telemetry;
pub mod testing;
pub mod transport;

pub use config::NodeConfig;
pub use error::{NodeError, NodeResult};
pub use link::{LinkEvent, LinkManager, LinkState};
pub use sensor::{SensorReading, SensorSource};
pub use session::{SessionEvent, SessionManager};
pub use telemetry::{Channel, TelemetryPublisher};
pub use transport::{mqtt::MqttSession, Publisher, QosLevel};
