use chrono::Utc;
use tracing::{debug, warn};

use crate::notify::{NotificationKind, Notifier};
use crate::protocol::{InboundEvent, StatusKind, TranscriptEvent};
use crate::session::Session;
use crate::transcript::TranscriptSink;

/// Routes inbound frames to their handler
///
/// Every frame is handled to completion before the next one is read, so
/// transcript events reach the sink in arrival order.
pub struct Dispatcher {
    transcripts: Box<dyn TranscriptSink>,
    notifier: Box<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(transcripts: Box<dyn TranscriptSink>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            transcripts,
            notifier,
        }
    }

    pub fn notify(&self, kind: NotificationKind, title: &str, message: Option<&str>) {
        self.notifier.notify(kind, title, message);
    }

    /// Parse and route one raw text frame
    pub fn dispatch(&mut self, raw: &str, session: &mut Session) {
        let event = match InboundEvent::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                return;
            }
        };

        debug!("Received {:?}", event);

        match event {
            InboundEvent::Transcript(transcript) => self.on_transcript(transcript, session),
            InboundEvent::Status(status) => {
                debug!("Status event {}", status.kind.as_str());
                let (kind, title, fallback) = status_notification(status.kind);
                let message = status.message.as_deref().unwrap_or(fallback);
                self.notifier.notify(kind, title, Some(message));
            }
            InboundEvent::Pong { .. } => {
                session.last_pong_at = Some(Utc::now());
                debug!("Heartbeat acknowledged");
            }
            InboundEvent::Unknown(kind) => {
                debug!("Unhandled message type: {}", kind);
            }
        }
    }

    fn on_transcript(&mut self, transcript: TranscriptEvent, session: &Session) {
        // Only drop frames that explicitly belong to another meeting
        if let (Some(frame_meeting), Some(current)) =
            (transcript.meeting_id.as_deref(), session.current_meeting_id.as_deref())
        {
            if frame_meeting != current {
                debug!(
                    "Ignoring transcript for meeting {} (joined {})",
                    frame_meeting, current
                );
                return;
            }
        }

        self.transcripts.on_transcript(transcript);
    }
}

/// Notification kind, title and fallback text for a status event
fn status_notification(kind: StatusKind) -> (NotificationKind, &'static str, &'static str) {
    match kind {
        StatusKind::MeetingStarted => (
            NotificationKind::Success,
            "Meeting started",
            "Meeting recording has started",
        ),
        StatusKind::MeetingEnded => (
            NotificationKind::Info,
            "Meeting ended",
            "Meeting recording has ended",
        ),
        StatusKind::RecordingStarted => (
            NotificationKind::Success,
            "Recording started",
            "Recording has started",
        ),
        StatusKind::RecordingStopped => (
            NotificationKind::Info,
            "Recording stopped",
            "Recording has stopped",
        ),
        StatusKind::JoinedMeeting => (
            NotificationKind::Success,
            "Joined meeting",
            "Joined the meeting",
        ),
        StatusKind::LeftMeeting => (NotificationKind::Info, "Left meeting", "Left the meeting"),
        StatusKind::Error => (NotificationKind::Error, "Error", "An unknown error occurred"),
    }
}
