//! Transcript ingestion
//!
//! The connection manager hands every transcript event to a [`TranscriptSink`].
//! What happens next (storage, display) belongs to the sink.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::TranscriptEvent;

/// A single transcript segment from the STT service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Backend-assigned segment id, stable across partial updates
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub meeting_id: Option<String>,

    #[serde(default)]
    pub speaker: Option<String>,

    /// Transcribed text
    pub text: String,

    /// Offset into the meeting, in seconds
    #[serde(default)]
    pub timestamp: f64,

    /// Confidence score (0.0 to 1.0), if available
    #[serde(default)]
    pub confidence: Option<f32>,

    /// Whether this is a final (not interim) result
    #[serde(default = "final_by_default")]
    pub is_final: bool,
}

fn final_by_default() -> bool {
    true
}

/// Receiver of transcript events, called on the connection driver
pub trait TranscriptSink: Send {
    fn on_transcript(&mut self, event: TranscriptEvent);
}

impl TranscriptSink for mpsc::UnboundedSender<TranscriptEvent> {
    fn on_transcript(&mut self, event: TranscriptEvent) {
        if self.send(event).is_err() {
            debug!("Transcript receiver dropped, discarding event");
        }
    }
}

/// In-memory transcript collection
///
/// Segments with a known id replace the previous version (partial results get
/// refined by later ones). Segments stay ordered by timestamp.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    segments: Arc<Mutex<Vec<TranscriptSegment>>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a segment
    pub fn add(&self, segment: TranscriptSegment) {
        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);

        let existing = segment
            .id
            .as_ref()
            .and_then(|id| segments.iter().position(|s| s.id.as_ref() == Some(id)));

        match existing {
            Some(index) => segments[index] = segment,
            None => segments.push(segment),
        }

        // Stable sort keeps arrival order for equal timestamps
        segments.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    /// All segments, ordered by timestamp
    pub fn segments(&self) -> Vec<TranscriptSegment> {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Segments belonging to one meeting
    pub fn for_meeting(&self, meeting_id: &str) -> Vec<TranscriptSegment> {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.meeting_id.as_deref() == Some(meeting_id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.segments.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.segments.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl TranscriptSink for TranscriptStore {
    fn on_transcript(&mut self, event: TranscriptEvent) {
        match event.segment() {
            Some(segment) => self.add(segment),
            None => warn!("Transcript payload is not a segment: {}", event.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str, text: &str, timestamp: f64) -> TranscriptSegment {
        TranscriptSegment {
            id: Some(id.to_string()),
            meeting_id: Some("m1".to_string()),
            speaker: None,
            text: text.to_string(),
            timestamp,
            confidence: None,
            is_final: true,
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let store = TranscriptStore::new();
        store.add(segment("a", "hel", 1.0));
        store.add(segment("a", "hello", 1.0));

        let segments = store.segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hello");
    }

    #[test]
    fn test_segments_ordered_by_timestamp() {
        let store = TranscriptStore::new();
        store.add(segment("b", "second", 2.0));
        store.add(segment("a", "first", 1.0));

        let texts: Vec<_> = store.segments().into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_for_meeting_filters_and_clear_empties() {
        let store = TranscriptStore::new();
        store.add(segment("a", "ours", 1.0));
        store.add(TranscriptSegment {
            meeting_id: Some("m2".to_string()),
            ..segment("b", "theirs", 2.0)
        });
        store.add(TranscriptSegment {
            meeting_id: None,
            ..segment("c", "unscoped", 3.0)
        });

        let ours: Vec<_> = store.for_meeting("m1").into_iter().map(|s| s.text).collect();
        assert_eq!(ours, vec!["ours"]);
        assert_eq!(store.for_meeting("m2").len(), 1);
        assert!(store.for_meeting("m3").is_empty());
        assert_eq!(store.len(), 3);

        store.clear();
        assert!(store.is_empty());
        assert!(store.for_meeting("m1").is_empty());
    }
}
