use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{RealtimeError, Result};

/// Command sent from the client to the realtime backend
///
/// Messages are delivered in the order they are issued, whether they go out
/// immediately or wait in the outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    JoinMeeting { meeting_id: String },
    LeaveMeeting { meeting_id: String },
    StartRecording { meeting_id: String },
    StopRecording { meeting_id: String },
    /// PCM bytes, already base64-encoded for the wire
    AudioFrame { meeting_id: String, audio_data: String },
    Ping,
}

/// Outbound wire frame (one JSON object per message)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl OutboundMessage {
    /// Build an audio frame message from raw PCM bytes
    pub fn audio_frame(meeting_id: impl Into<String>, pcm_bytes: &[u8]) -> Self {
        Self::AudioFrame {
            meeting_id: meeting_id.into(),
            audio_data: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
        }
    }

    /// Wire name of this message type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinMeeting { .. } => "join_meeting",
            Self::LeaveMeeting { .. } => "leave_meeting",
            Self::StartRecording { .. } => "start_recording",
            Self::StopRecording { .. } => "stop_recording",
            // The backend names audio frames "audio_data" on the wire
            Self::AudioFrame { .. } => "audio_data",
            Self::Ping => "ping",
        }
    }

    pub fn meeting_id(&self) -> Option<&str> {
        match self {
            Self::JoinMeeting { meeting_id }
            | Self::LeaveMeeting { meeting_id }
            | Self::StartRecording { meeting_id }
            | Self::StopRecording { meeting_id }
            | Self::AudioFrame { meeting_id, .. } => Some(meeting_id),
            Self::Ping => None,
        }
    }

    pub fn to_frame(&self) -> OutboundFrame {
        let (audio_data, data) = match self {
            // The backend reads audio from `data`, browsers historically sent
            // `audio_data`. Carry both.
            Self::AudioFrame { audio_data, .. } => (
                Some(audio_data.clone()),
                Some(serde_json::Value::String(audio_data.clone())),
            ),
            _ => (None, None),
        };

        OutboundFrame {
            kind: self.kind().to_string(),
            meeting_id: self.meeting_id().map(str::to_string),
            audio_data,
            data,
        }
    }

    /// Serialize to the JSON text sent over the socket
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_frame())?)
    }

    /// Rebuild a message from text produced by [`OutboundMessage::encode`]
    pub fn decode(raw: &str) -> Result<Self> {
        let frame: OutboundFrame =
            serde_json::from_str(raw).map_err(|e| RealtimeError::Decode(e.to_string()))?;
        Self::from_frame(frame)
    }

    pub fn from_frame(frame: OutboundFrame) -> Result<Self> {
        if frame.kind == "ping" {
            return Ok(Self::Ping);
        }

        let meeting_id = frame.meeting_id.ok_or_else(|| {
            RealtimeError::Decode(format!("{} frame without meeting_id", frame.kind))
        })?;

        let message = match frame.kind.as_str() {
            "join_meeting" => Self::JoinMeeting { meeting_id },
            "leave_meeting" => Self::LeaveMeeting { meeting_id },
            "start_recording" => Self::StartRecording { meeting_id },
            "stop_recording" => Self::StopRecording { meeting_id },
            "audio_data" => {
                let audio_data = frame.audio_data.ok_or_else(|| {
                    RealtimeError::Decode("audio_data frame without audio".to_string())
                })?;
                Self::AudioFrame {
                    meeting_id,
                    audio_data,
                }
            }
            other => {
                return Err(RealtimeError::Decode(format!(
                    "unknown message type '{}'",
                    other
                )))
            }
        };

        Ok(message)
    }
}
