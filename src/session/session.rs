use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::state::ConnectionState;

/// Identity of this client on the realtime backend
///
/// Generated once and reused for every reconnect of the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// `client_{unix millis}_{9 random lowercase alphanumerics}`
    pub fn generate() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "client_{}_{}",
            Utc::now().timestamp_millis(),
            &suffix[..9]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection identity and lifecycle
#[derive(Debug, Default)]
pub struct Session {
    client_id: Option<ClientId>,
    state: ConnectionState,

    /// Meeting this client joined; only set while connecting or connected
    pub current_meeting_id: Option<String>,

    /// Consecutive automatic reconnects scheduled since the last successful open
    pub reconnect_attempts: u32,

    pub last_error: Option<String>,

    /// When the backend last answered a heartbeat (informational only)
    pub last_pong_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    /// Return the client id, generating it on first use
    pub fn ensure_client_id(&mut self) -> &ClientId {
        self.client_id.get_or_insert_with(|| {
            let id = ClientId::generate();
            info!("Generated client id {}", id);
            id
        })
    }

    /// Move to `next`, logging the change
    ///
    /// Transitions outside the lifecycle table are still applied (the caller
    /// is the only writer) but logged loudly. Leaving the active states
    /// forgets the joined meeting.
    pub fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }

        if !self.state.can_transition_to(next) {
            warn!("Unexpected connection transition {} -> {}", self.state, next);
        } else {
            info!("Connection {} -> {}", self.state, next);
        }

        self.state = next;

        if !next.is_active() {
            if let Some(meeting_id) = self.current_meeting_id.take() {
                info!("No longer in meeting {}", meeting_id);
            }
        }
    }
}
