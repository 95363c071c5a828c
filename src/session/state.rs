use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the realtime connection
///
/// ```text
/// Idle -> Connecting -> Connected -> Closing -> Closed
/// ```
///
/// A failed handshake falls back from `Connecting` to `Idle`. A dropped
/// connection always passes through `Closed` or `Idle` before the next
/// `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connecting, Idle)
                | (Connecting, Closing)
                | (Connected, Closing)
                | (Connected, Closed)
                | (Connected, Idle)
                | (Closing, Idle)
                | (Closing, Closed)
                | (Closed, Connecting)
                | (Closed, Idle)
        )
    }

    /// `Connected` or `Connecting`
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;

    #[test]
    fn test_drop_never_goes_straight_to_connecting() {
        assert!(!Connected.can_transition_to(Connecting));
        assert!(Connected.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Connecting));
    }

    #[test]
    fn test_failed_handshake_returns_to_idle() {
        assert!(Connecting.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(Connected));
    }
}
