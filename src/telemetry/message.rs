//! Telemetry message construction
//!
//! The six telemetry channels, their fixed topics, and the payload encoding.
//! Topic strings exist only here; the publish loop iterates [`Channel::ALL`]
//! rather than assembling strings.

use crate::sensor::SensorReading;

/// One of the six published telemetry channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Digital1,
    Digital2,
    Digital3,
    Digital4,
    Analog1,
    Analog2,
}

impl Channel {
    /// Every channel, in publish order (digitals first, then analogs)
    pub const ALL: [Channel; 6] = [
        Channel::Digital1,
        Channel::Digital2,
        Channel::Digital3,
        Channel::Digital4,
        Channel::Analog1,
        Channel::Analog2,
    ];

    /// Topic this channel publishes to
    pub fn topic(&self) -> &'static str {
        match self {
            Channel::Digital1 => "/esp32/digital1",
            Channel::Digital2 => "/esp32/digital2",
            Channel::Digital3 => "/esp32/digital3",
            Channel::Digital4 => "/esp32/digital4",
            Channel::Analog1 => "/esp32/analog1",
            Channel::Analog2 => "/esp32/analog2",
        }
    }

    /// Numeric value of this channel in a reading. Digital levels encode as
    /// 0 or 1.
    pub fn value(&self, reading: &SensorReading) -> i64 {
        match self {
            Channel::Digital1 => i64::from(reading.d1),
            Channel::Digital2 => i64::from(reading.d2),
            Channel::Digital3 => i64::from(reading.d3),
            Channel::Digital4 => i64::from(reading.d4),
            Channel::Analog1 => i64::from(reading.a1),
            Channel::Analog2 => i64::from(reading.a2),
        }
    }
}

/// Encode a channel value as the wire payload, e.g. `{"value": 42}`
pub fn format_value_payload(value: i64) -> String {
    format!("{{\"value\": {value}}}")
}
