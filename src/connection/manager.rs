use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use super::dispatcher::Dispatcher;
use super::heartbeat::Heartbeat;
use super::queue::OutboundQueue;
use super::reconnect::ReconnectPolicy;
use crate::config::RealtimeConfig;
use crate::error::{RealtimeError, Result};
use crate::notify::NotificationKind;
use crate::protocol::{OutboundMessage, NORMAL_CLOSURE};
use crate::session::{ConnectionState, Session, SessionSnapshot};
use crate::transport::{
    endpoint_url, socket_scheme, Connector, EventSender, Link, TransportEvent, TransportEventKind,
};

const DISCONNECT_REASON: &str = "client disconnect";

/// Realtime connection state machine
///
/// Owns the session, the outbound queue, the reconnect and heartbeat timers
/// and the single transport link. It performs no I/O or waiting of its own:
/// every input (command, transport event, timer) is handed in together with
/// the current time, and timers are exposed as deadlines through
/// [`ConnectionManager::next_deadline`].
pub struct ConnectionManager {
    origin: Url,
    session: Session,
    queue: OutboundQueue,
    reconnect: ReconnectPolicy,
    heartbeat: Heartbeat,
    dispatcher: Dispatcher,
    connector: Box<dyn Connector>,
    link: Option<Box<dyn Link>>,

    /// Generation of the current link; events from older links are stale
    generation: u64,

    events: EventSender,
}

impl ConnectionManager {
    pub fn new(
        config: &RealtimeConfig,
        connector: Box<dyn Connector>,
        dispatcher: Dispatcher,
        events: EventSender,
    ) -> Result<Self> {
        let origin = config.origin_url()?;
        socket_scheme(&origin)?;

        Ok(Self {
            origin,
            session: Session::new(),
            queue: OutboundQueue::new(config.outbound_queue_limit),
            reconnect: ReconnectPolicy::new(
                config.max_reconnect_attempts,
                config.reconnect_base_delay(),
            ),
            heartbeat: Heartbeat::new(config.heartbeat_interval()),
            dispatcher,
            connector,
            link: None,
            generation: 0,
            events,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state(),
            client_id: self.session.client_id().map(|id| id.to_string()),
            current_meeting_id: self.session.current_meeting_id.clone(),
            reconnect_attempts: self.session.reconnect_attempts,
            last_error: self.session.last_error.clone(),
            queued_messages: self.queue.len(),
            reconnect_pending: self.reconnect.is_pending(),
            last_pong_at: self.session.last_pong_at,
        }
    }

    /// Open the transport unless already connected or connecting
    pub fn connect(&mut self, now: Instant) {
        if self.session.state().is_active() {
            debug!("connect() ignored, already {}", self.session.state());
            return;
        }

        let client_id = self.session.ensure_client_id().clone();
        self.session.transition(ConnectionState::Connecting);

        let url = match endpoint_url(&self.origin, &client_id) {
            Ok(url) => url,
            Err(e) => return self.fail_connect(e, now),
        };

        self.generation += 1;
        info!("Connecting to {} (generation {})", url, self.generation);

        match self.connector.open(&url, self.generation, self.events.clone()) {
            Ok(link) => self.link = Some(link),
            Err(e) => self.fail_connect(e, now),
        }
    }

    /// Close deliberately and reset the session
    ///
    /// Safe to call in any state, any number of times.
    pub fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            self.session.transition(ConnectionState::Closing);
            link.close(NORMAL_CLOSURE, DISCONNECT_REASON);
        }

        // Whatever the old link still reports is no longer ours
        self.generation += 1;

        self.session.transition(ConnectionState::Idle);
        self.session.reconnect_attempts = 0;
        self.session.current_meeting_id = None;
        self.reconnect.cancel();
        self.heartbeat.stop();

        debug!("Disconnected ({} messages still queued)", self.queue.len());
    }

    /// Transmit now if connected, otherwise queue (and reconnect if allowed)
    pub fn send_message(&mut self, message: OutboundMessage, now: Instant) {
        if self.session.state() == ConnectionState::Connected {
            if let Err(message) = self.transmit(message) {
                self.enqueue(message);
            }
            return;
        }

        debug!("Queueing {} while {}", message.kind(), self.session.state());
        self.enqueue(message);

        if self.reconnect.is_eligible(&self.session) {
            self.connect(now);
        }
    }

    /// Send `join_meeting` and track the meeting while the connection is up
    ///
    /// With no connection attempt left the join stays queued but the meeting
    /// is not tracked.
    pub fn join_meeting(&mut self, meeting_id: String, now: Instant) {
        info!("Joining meeting {}", meeting_id);
        self.send_message(
            OutboundMessage::JoinMeeting {
                meeting_id: meeting_id.clone(),
            },
            now,
        );

        if self.session.state().is_active() {
            self.session.current_meeting_id = Some(meeting_id);
        } else {
            warn!("Join for {} queued while {}", meeting_id, self.session.state());
        }
    }

    /// Leave the joined meeting; no-op when none is joined
    pub fn leave_meeting(&mut self, now: Instant) {
        let Some(meeting_id) = self.session.current_meeting_id.take() else {
            debug!("leave_meeting() ignored, no meeting joined");
            return;
        };

        info!("Leaving meeting {}", meeting_id);
        self.send_message(OutboundMessage::LeaveMeeting { meeting_id }, now);
    }

    pub fn start_recording(&mut self, meeting_id: String, now: Instant) {
        self.send_message(OutboundMessage::StartRecording { meeting_id }, now);
    }

    pub fn stop_recording(&mut self, meeting_id: String, now: Instant) {
        self.send_message(OutboundMessage::StopRecording { meeting_id }, now);
    }

    pub fn send_audio_frame(&mut self, meeting_id: String, pcm_bytes: &[u8], now: Instant) {
        self.send_message(OutboundMessage::audio_frame(meeting_id, pcm_bytes), now);
    }

    pub fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        if event.generation != self.generation || self.link.is_none() {
            debug!(
                "Ignoring stale transport event from generation {} (current {})",
                event.generation, self.generation
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened => self.on_open(now),
            TransportEventKind::Message(raw) => self.dispatcher.dispatch(&raw, &mut self.session),
            TransportEventKind::Error(e) => {
                warn!("Transport error: {}", e);
                self.dispatcher.notify(
                    NotificationKind::Error,
                    "Connection error",
                    Some("The realtime connection reported an error"),
                );
                self.session.last_error = Some(e);
            }
            TransportEventKind::Unsent(frames) => self.requeue_unsent(frames),
            TransportEventKind::Closed { code, reason } => self.on_close(code, &reason, now),
        }
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.reconnect.deadline(), self.heartbeat.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer that is due at `now`
    pub fn on_timers(&mut self, now: Instant) {
        if self.reconnect.take_due(now) {
            // Budget was charged when the attempt was scheduled
            if self.session.state().is_active() {
                debug!("Reconnect timer fired while {}, skipping", self.session.state());
            } else {
                info!(
                    "Reconnect attempt {}/{}",
                    self.session.reconnect_attempts,
                    self.reconnect.max_attempts()
                );
                self.connect(now);
            }
        }

        if self.heartbeat.take_due(now) && self.session.state() == ConnectionState::Connected {
            self.send_message(OutboundMessage::Ping, now);
        }
    }

    fn on_open(&mut self, now: Instant) {
        if self.session.state() != ConnectionState::Connecting {
            warn!("Transport opened while {}", self.session.state());
            return;
        }

        self.session.transition(ConnectionState::Connected);
        self.session.reconnect_attempts = 0;
        self.session.last_error = None;
        self.reconnect.cancel();

        info!("Connected, flushing {} queued messages", self.queue.len());
        self.flush();
        self.heartbeat.start(now);

        self.dispatcher.notify(
            NotificationKind::Success,
            "Connected",
            Some("Realtime connection established"),
        );
    }

    fn on_close(&mut self, code: u16, reason: &str, now: Instant) {
        self.heartbeat.stop();
        self.link = None;

        info!("Connection closed (code {}, reason {:?})", code, reason);

        if code == NORMAL_CLOSURE {
            self.session.transition(ConnectionState::Idle);
            return;
        }

        let next = if self.session.state() == ConnectionState::Connecting {
            // Handshake never completed
            ConnectionState::Idle
        } else {
            ConnectionState::Closed
        };
        self.session.transition(next);

        self.after_drop(now);
    }

    fn fail_connect(&mut self, err: RealtimeError, now: Instant) {
        error!("Failed to open connection: {}", err);
        let message = err.to_string();
        self.dispatcher
            .notify(NotificationKind::Error, "Connection failed", Some(&message));
        self.session.last_error = Some(message);

        self.session.transition(ConnectionState::Idle);
        self.after_drop(now);
    }

    fn after_drop(&mut self, now: Instant) {
        if self.reconnect.is_eligible(&self.session) {
            let delay = self.reconnect.schedule(&mut self.session, now);
            info!(
                "Reconnecting in {}ms (attempt {}/{})",
                delay.as_millis(),
                self.session.reconnect_attempts,
                self.reconnect.max_attempts()
            );
        } else if self.reconnect.is_exhausted(&self.session) {
            warn!(
                "Giving up after {} reconnect attempts",
                self.session.reconnect_attempts
            );
            self.dispatcher.notify(
                NotificationKind::Error,
                "Connection lost",
                Some("Could not reconnect to the server"),
            );
        }
    }

    /// Send queued messages in order while the connection holds
    fn flush(&mut self) {
        while self.session.state() == ConnectionState::Connected {
            let Some(message) = self.queue.pop_front() else {
                break;
            };

            if let Err(message) = self.transmit(message) {
                // Keep it at the head so nothing behind it is reordered
                self.queue.push_front(message);
                break;
            }
        }
    }

    /// Hand a message to the link, giving it back if it could not be sent
    ///
    /// Messages that fail to encode are dropped; a retry would fail the same
    /// way.
    fn transmit(&mut self, message: OutboundMessage) -> std::result::Result<(), OutboundMessage> {
        let Some(link) = self.link.as_mut() else {
            return Err(message);
        };

        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Dropping {} message: {}", message.kind(), e);
                return Ok(());
            }
        };

        match link.send(frame) {
            Ok(()) => {
                debug!("Sent {}", message.kind());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to send {}: {}", message.kind(), e);
                Err(message)
            }
        }
    }

    /// Put frames the link accepted but never wrote back at the head
    fn requeue_unsent(&mut self, frames: Vec<String>) {
        warn!("Requeueing {} frames the transport never wrote", frames.len());

        for raw in frames.into_iter().rev() {
            match OutboundMessage::decode(&raw) {
                // Stale pings are not worth resending
                Ok(OutboundMessage::Ping) => {}
                Ok(message) => self.queue.push_front(message),
                Err(e) => error!("Dropping unsent frame: {}", e),
            }
        }
    }

        fn enqueue(&mut self, message: OutboundMessage) {
        if let Some(evicted) = self.queue.push_back(message) {
            warn!(
                "Outbound queue full, dropped oldest {} message",
                evicted.kind()
            );
            self.dispatcher.notify(
                NotificationKind::Warning,
                "Message dropped",
                Some("Too many messages waiting for the connection"),
            );
        }
    }
}
