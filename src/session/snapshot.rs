use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::ConnectionState;

/// Point-in-time view of the connection session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: ConnectionState,

    /// Assigned on the first connect
    pub client_id: Option<String>,

    pub current_meeting_id: Option<String>,

    pub reconnect_attempts: u32,

    pub last_error: Option<String>,

    /// Messages waiting for the next successful connection
    pub queued_messages: usize,

    /// Whether an automatic reconnect is scheduled
    pub reconnect_pending: bool,

    pub last_pong_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}
