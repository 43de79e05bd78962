//! Session event model
//!
//! Broker-session lifecycle events and the pure decision function mapping
//! them to actions. Keeping the decision separate from execution makes the
//! idempotence rules (greeting on every establishment, publisher spawned at
//! most once) directly testable without a broker.

use tracing::{error, info, warn};

/// Lifecycle events emitted by the broker transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The broker acknowledged the connection
    Established,
    /// The connection to the broker dropped
    Lost(String),
    /// The transport reported an error
    Error(String),
}

/// Actions the session manager executes in response to an event, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Publish the greeting message
    PublishGreeting,
    /// Start the periodic telemetry publisher
    SpawnPublisher,
}

/// Decide what to do for a session event.
///
/// `publisher_running` reflects whether the telemetry publisher has already
/// been spawned; it gates the spawn action but never the greeting, which is
/// re-sent on every establishment including reconnects.
pub fn route_session_event(event: &SessionEvent, publisher_running: bool) -> Vec<SessionAction> {
    match event {
        SessionEvent::Established => {
            info!("broker session established");
            let mut actions = vec![SessionAction::PublishGreeting];
            if !publisher_running {
                actions.push(SessionAction::SpawnPublisher);
            }
            actions
        }
        SessionEvent::Lost(reason) => {
            // Recovery is owned by the transport's reconnect loop; nothing
            // to do here beyond recording the loss.
            warn!(reason = %reason, "broker session lost");
            Vec::new()
        }
        SessionEvent::Error(message) => {
            error!(message = %message, "broker session error");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_establishment_greets_and_spawns() {
        let actions = route_session_event(&SessionEvent::Established, false);
        assert_eq!(
            actions,
            vec![SessionAction::PublishGreeting, SessionAction::SpawnPublisher]
        );
    }

    #[test]
    fn test_reestablishment_greets_without_respawn() {
        let actions = route_session_event(&SessionEvent::Established, true);
        assert_eq!(actions, vec![SessionAction::PublishGreeting]);
    }

    #[test]
    fn test_loss_and_error_are_log_only() {
        assert!(route_session_event(&SessionEvent::Lost("io".to_string()), false).is_empty());
        assert!(route_session_event(&SessionEvent::Error("bad".to_string()), true).is_empty());
    }
}
