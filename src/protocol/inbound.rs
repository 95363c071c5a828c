use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptSegment;

/// Inbound wire frame as sent by the realtime backend
///
/// Fields the client does not know about (e.g. `summary` on `meeting_ended`)
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub meeting_id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Server-side status changes that are surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    MeetingStarted,
    MeetingEnded,
    RecordingStarted,
    RecordingStopped,
    JoinedMeeting,
    LeftMeeting,
    Error,
}

impl StatusKind {
    fn from_wire(kind: &str) -> Option<Self> {
        let status = match kind {
            "meeting_started" => Self::MeetingStarted,
            "meeting_ended" => Self::MeetingEnded,
            "recording_started" => Self::RecordingStarted,
            "recording_stopped" => Self::RecordingStopped,
            "joined_meeting" => Self::JoinedMeeting,
            "left_meeting" => Self::LeftMeeting,
            "error" => Self::Error,
            _ => return None,
        };
        Some(status)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeetingStarted => "meeting_started",
            Self::MeetingEnded => "meeting_ended",
            Self::RecordingStarted => "recording_started",
            Self::RecordingStopped => "recording_stopped",
            Self::JoinedMeeting => "joined_meeting",
            Self::LeftMeeting => "left_meeting",
            Self::Error => "error",
        }
    }
}

/// A transcript update for a meeting
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub meeting_id: Option<String>,
    pub data: serde_json::Value,
    pub timestamp: Option<String>,
}

impl TranscriptEvent {
    /// Typed view of the payload, if it has the shape of a transcript segment
    pub fn segment(&self) -> Option<TranscriptSegment> {
        let mut segment: TranscriptSegment = serde_json::from_value(self.data.clone()).ok()?;
        if segment.meeting_id.is_none() {
            segment.meeting_id = self.meeting_id.clone();
        }
        Some(segment)
    }
}

/// A status change reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub meeting_id: Option<String>,
    pub message: Option<String>,
}

/// Classified inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Transcript(TranscriptEvent),
    Status(StatusEvent),
    Pong { timestamp: Option<String> },
    /// A `type` the client has no handler for
    Unknown(String),
}

impl InboundEvent {
    /// Parse a raw text frame
    ///
    /// Only malformed JSON (or a frame without `type`) fails. Unrecognized
    /// types parse to `Unknown`.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        let frame: InboundFrame = serde_json::from_str(raw)?;
        Ok(Self::from_frame(frame))
    }

    pub fn from_frame(frame: InboundFrame) -> Self {
        match frame.kind.as_str() {
            "transcript" => Self::Transcript(TranscriptEvent {
                meeting_id: frame.meeting_id,
                data: frame.data.unwrap_or(serde_json::Value::Null),
                timestamp: frame.timestamp,
            }),
            "pong" => Self::Pong {
                timestamp: frame.timestamp,
            },
            other => match StatusKind::from_wire(other) {
                Some(kind) => Self::Status(StatusEvent {
                    kind,
                    meeting_id: frame.meeting_id,
                    message: frame.message,
                }),
                None => Self::Unknown(frame.kind),
            },
        }
    }
}
