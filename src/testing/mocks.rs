//! Mock implementations for testing

use crate::error::NodeResult;
use crate::link::NetworkInterface;
use crate::sensor::{AnalogChannel, DigitalChannel, SensorSource};
use crate::transport::{Publisher, QosLevel, TransportError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One captured publish call
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QosLevel,
    pub retain: bool,
}

/// Mock publisher capturing every publish call, connected by default
#[derive(Debug)]
pub struct MockPublisher {
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    should_fail: AtomicBool,
    connected: AtomicBool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            should_fail: AtomicBool::new(false),
            connected: AtomicBool::new(true),
        }
    }

    /// Make subsequent publishes fail with a transport error
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Snapshot of every successful publish, in call order
    pub fn published_messages(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    type Error = TransportError;

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<(), Self::Error> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(TransportError::PublishFailed(
                "mock publish failure".into(),
            ));
        }
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload,
            qos,
            retain,
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Mock sensor source with settable channel values
#[derive(Debug, Default)]
pub struct MockSensorSource {
    digital: [AtomicBool; 4],
    analog: [Mutex<u16>; 2],
}

impl MockSensorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_digital(&self, channel: DigitalChannel, level: bool) {
        self.digital[channel as usize].store(level, Ordering::SeqCst);
    }

    pub fn set_analog(&self, channel: AnalogChannel, value: u16) {
        *self.analog[channel as usize].lock().unwrap() = value;
    }
}

impl SensorSource for MockSensorSource {
    fn read_digital(&self, channel: DigitalChannel) -> bool {
        self.digital[channel as usize].load(Ordering::SeqCst)
    }

    fn read_analog(&self, channel: AnalogChannel) -> u16 {
        *self.analog[channel as usize].lock().unwrap()
    }
}

/// Mock network interface counting connect requests
#[derive(Debug, Default)]
pub struct MockNetworkInterface {
    requests: Arc<AtomicUsize>,
    should_fail: bool,
}

impl MockNetworkInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interface whose connect requests always fail
    pub fn failing() -> Self {
        Self {
            requests: Arc::new(AtomicUsize::new(0)),
            should_fail: true,
        }
    }

    /// Shared counter of connect requests issued so far
    pub fn connect_requests(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl NetworkInterface for MockNetworkInterface {
    async fn request_connect(&self) -> NodeResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(crate::error::NodeError::link("mock connect failure"));
        }
        Ok(())
    }
}
