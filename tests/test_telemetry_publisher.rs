//! Telemetry publisher integration tests
//!
//! Uses the paused tokio clock so publish cadence can be asserted
//! deterministically.

use sensornode::sensor::{AnalogChannel, DigitalChannel, SensorSource};
use sensornode::telemetry::TelemetryPublisher;
use sensornode::testing::mocks::{MockPublisher, MockSensorSource};
use sensornode::transport::QosLevel;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_test::assert_ok;

const PERIOD: Duration = Duration::from_millis(2000);

async fn settle() {
    // Let the spawned task run its pending cycle
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_publishes_expected_messages() {
    let publisher = Arc::new(MockPublisher::new());
    let sensors = Arc::new(MockSensorSource::new());
    sensors.set_digital(DigitalChannel::D1, true);
    sensors.set_analog(AnalogChannel::A1, 1234);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let _handle = TelemetryPublisher::spawn(
        Arc::clone(&publisher),
        sensors as Arc<dyn SensorSource>,
        PERIOD,
        shutdown_rx,
    );
    settle().await;

    let published = publisher.published_messages();
    let seen: Vec<(String, String)> = published
        .iter()
        .map(|m| {
            (
                m.topic.clone(),
                String::from_utf8(m.payload.clone()).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        seen,
        vec![
            ("/esp32/digital1".to_string(), "{\"value\": 1}".to_string()),
            ("/esp32/digital2".to_string(), "{\"value\": 0}".to_string()),
            ("/esp32/digital3".to_string(), "{\"value\": 0}".to_string()),
            ("/esp32/digital4".to_string(), "{\"value\": 0}".to_string()),
            ("/esp32/analog1".to_string(), "{\"value\": 1234}".to_string()),
            ("/esp32/analog2".to_string(), "{\"value\": 0}".to_string()),
        ]
    );
    assert!(published
        .iter()
        .all(|m| m.qos == QosLevel::AtLeastOnce && !m.retain));
}

#[tokio::test(start_paused = true)]
async fn test_cadence_over_multiple_periods() {
    let publisher = Arc::new(MockPublisher::new());
    let sensors: Arc<dyn SensorSource> = Arc::new(MockSensorSource::new());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let _handle =
        TelemetryPublisher::spawn(Arc::clone(&publisher), sensors, PERIOD, shutdown_rx);
    settle().await;
    assert_eq!(publisher.published_messages().len(), 6);

    tokio::time::advance(PERIOD).await;
    settle().await;
    assert_eq!(publisher.published_messages().len(), 12);

    tokio::time::advance(PERIOD).await;
    settle().await;
    assert_eq!(publisher.published_messages().len(), 18);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_survives_publish_failures() {
    let publisher = Arc::new(MockPublisher::new());
    let sensors: Arc<dyn SensorSource> = Arc::new(MockSensorSource::new());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    publisher.set_should_fail(true);
    let _handle =
        TelemetryPublisher::spawn(Arc::clone(&publisher), sensors, PERIOD, shutdown_rx);
    settle().await;
    assert!(publisher.published_messages().is_empty());

    // Once publishing recovers the cadence is unchanged
    publisher.set_should_fail(false);
    tokio::time::advance(PERIOD).await;
    settle().await;
    assert_eq!(publisher.published_messages().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_the_loop() {
    let publisher = Arc::new(MockPublisher::new());
    let sensors: Arc<dyn SensorSource> = Arc::new(MockSensorSource::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle =
        TelemetryPublisher::spawn(Arc::clone(&publisher), sensors, PERIOD, shutdown_rx);
    settle().await;

    shutdown_tx.send(true).unwrap();
    tokio_test::assert_ok!(handle.await);

    // No further cycles after cancellation
    tokio::time::advance(PERIOD).await;
    settle().await;
    assert_eq!(publisher.published_messages().len(), 6);
}
