//! Periodic telemetry publisher
//!
//! Samples the sensors and publishes all six channels every period. The loop
//! reads first and sleeps after, so the first cycle happens immediately when
//! the task starts. Publish failures are logged and skipped; the cadence is
//! never interrupted by a failed send.

use crate::sensor::{SensorReading, SensorSource};
use crate::transport::{Publisher, QosLevel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub mod message;

pub use message::{format_value_payload, Channel};

/// Periodic sensor sampling and publish task
pub struct TelemetryPublisher;

impl TelemetryPublisher {
    /// Spawn the publish loop. Runs until `shutdown` flips to true (or its
    /// sender is dropped); each cycle samples once and publishes the six
    /// channels in order at QoS 1, non-retained.
    pub fn spawn<P: Publisher + 'static>(
        publisher: Arc<P>,
        sensors: Arc<dyn SensorSource>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(period_ms = period.as_millis() as u64, "telemetry publisher started");
            let mut ticker = tokio::time::interval(period);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reading = SensorReading::sample(sensors.as_ref());
                        publish_cycle(publisher.as_ref(), &reading).await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("telemetry publisher stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}

/// Publish one full cycle of channel values from a single reading
async fn publish_cycle<P: Publisher>(publisher: &P, reading: &SensorReading) {
    for channel in Channel::ALL {
        let payload = format_value_payload(channel.value(reading));
        if let Err(e) = publisher
            .publish(
                channel.topic(),
                payload.into_bytes(),
                QosLevel::AtLeastOnce,
                false,
            )
            .await
        {
            // Skipped, not retried; the next cycle samples fresh values
            debug!(topic = channel.topic(), error = %e, "telemetry publish failed");
        }
    }
    info!(
        d1 = reading.d1 as u8,
        d2 = reading.d2 as u8,
        d3 = reading.d3 as u8,
        d4 = reading.d4 as u8,
        a1 = reading.a1,
        a2 = reading.a2,
        "telemetry cycle published"
    );
}
