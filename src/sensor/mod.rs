//! Sensor acquisition interface
//!
//! The node treats acquisition as an external collaborator: a synchronous,
//! best-effort read of four digital channels and two analog channels. No
//! error channel is modeled; an implementation that cannot read a channel
//! returns a best-effort value.

pub mod gpio;

pub use gpio::{PiSensors, SensorInitError};

/// One of the four digital input channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalChannel {
    D1,
    D2,
    D3,
    D4,
}

/// One of the two analog input channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    A1,
    A2,
}

/// Synchronous sensor reads, assumed non-blocking and fast.
///
/// Implementations must be safe to call from the telemetry task while the
/// rest of the node runs concurrently; the trait is a pure query with no
/// state of its own.
pub trait SensorSource: Send + Sync {
    fn read_digital(&self, channel: DigitalChannel) -> bool;
    fn read_analog(&self, channel: AnalogChannel) -> u16;
}

/// One sample of all six channels.
///
/// Produced fresh each publish cycle and not retained between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub d1: bool,
    pub d2: bool,
    pub d3: bool,
    pub d4: bool,
    pub a1: u16,
    pub a2: u16,
}

impl SensorReading {
    /// Read all six channels from the source
    pub fn sample(source: &dyn SensorSource) -> Self {
        Self {
            d1: source.read_digital(DigitalChannel::D1),
            d2: source.read_digital(DigitalChannel::D2),
            d3: source.read_digital(DigitalChannel::D3),
            d4: source.read_digital(DigitalChannel::D4),
            a1: source.read_analog(AnalogChannel::A1),
            a2: source.read_analog(AnalogChannel::A2),
        }
    }
}
