//! Pure link state machine
//!
//! Transitions are a pure function of (state, event) so the reconnect
//! behavior can be tested without a network. The driver loop in the parent
//! module applies the returned action.

use std::net::IpAddr;
use tracing::{info, warn};

/// State of the wireless network association
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// No association and no connect request in flight
    Disconnected,
    /// Connect request issued, waiting for an address
    Connecting,
    /// Associated with an assigned address (kept for diagnostics)
    Connected(IpAddr),
}

/// Link-layer and address-assignment events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The adapter came up at process start
    AdapterStarted,
    /// The network assigned us an address
    AddressAssigned(IpAddr),
    /// The association was lost
    Disconnected,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Issue (or re-issue) a connect request
    IssueConnect,
    /// The network is usable; signal downstream with the assigned address
    NetworkReady(IpAddr),
}

/// Compute the next state and side effect for a link event.
///
/// Every disconnect yields exactly one `IssueConnect` — no backoff, no retry
/// limit. This is the node's sole resilience mechanism for network loss.
pub fn transition(state: &LinkState, event: LinkEvent) -> (LinkState, Option<LinkAction>) {
    match event {
        LinkEvent::AdapterStarted => match state {
            LinkState::Disconnected => {
                info!("network adapter started, issuing connect request");
                (LinkState::Connecting, Some(LinkAction::IssueConnect))
            }
            // Duplicate start events carry no new information
            _ => (state.clone(), None),
        },
        LinkEvent::AddressAssigned(addr) => {
            info!(address = %addr, "network address assigned");
            (
                LinkState::Connected(addr),
                Some(LinkAction::NetworkReady(addr)),
            )
        }
        LinkEvent::Disconnected => {
            warn!("network association lost, re-issuing connect request");
            (LinkState::Connecting, Some(LinkAction::IssueConnect))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50))
    }

    #[test]
    fn test_start_issues_connect() {
        let (state, action) = transition(&LinkState::Disconnected, LinkEvent::AdapterStarted);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(action, Some(LinkAction::IssueConnect));
    }

    #[test]
    fn test_duplicate_start_is_noop() {
        let (state, action) = transition(&LinkState::Connecting, LinkEvent::AdapterStarted);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(action, None);

        let (state, action) = transition(&LinkState::Connected(addr()), LinkEvent::AdapterStarted);
        assert_eq!(state, LinkState::Connected(addr()));
        assert_eq!(action, None);
    }

    #[test]
    fn test_address_assignment_reaches_connected() {
        let (state, action) = transition(&LinkState::Connecting, LinkEvent::AddressAssigned(addr()));
        assert_eq!(state, LinkState::Connected(addr()));
        assert_eq!(action, Some(LinkAction::NetworkReady(addr())));
    }

    #[test]
    fn test_disconnect_always_reconnects() {
        // From Connected
        let (state, action) = transition(&LinkState::Connected(addr()), LinkEvent::Disconnected);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(action, Some(LinkAction::IssueConnect));

        // From Connecting (connect attempt failed before an address arrived)
        let (state, action) = transition(&LinkState::Connecting, LinkEvent::Disconnected);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(action, Some(LinkAction::IssueConnect));

        // Even from Disconnected
        let (state, action) = transition(&LinkState::Disconnected, LinkEvent::Disconnected);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(action, Some(LinkAction::IssueConnect));
    }

    #[test]
    fn test_one_connect_per_disconnect_over_any_sequence() {
        // The invariant: across any event sequence, connect requests equal
        // disconnect events plus the initial adapter start.
        let events = vec![
            LinkEvent::AdapterStarted,
            LinkEvent::AddressAssigned(addr()),
            LinkEvent::Disconnected,
            LinkEvent::Disconnected,
            LinkEvent::AddressAssigned(addr()),
            LinkEvent::Disconnected,
        ];

        let mut state = LinkState::Disconnected;
        let mut connects = 0;
        for event in events {
            let (next, action) = transition(&state, event);
            if action == Some(LinkAction::IssueConnect) {
                connects += 1;
            }
            state = next;
        }

        assert_eq!(connects, 4); // 1 initial + 3 disconnects
        assert_eq!(state, LinkState::Connecting);
    }
}
