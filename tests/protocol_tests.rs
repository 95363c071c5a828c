use base64::Engine;
use meeting_realtime::protocol::{
    InboundEvent, OutboundFrame, OutboundMessage, StatusKind,
};

#[test]
fn test_join_meeting_frame() {
    let msg = OutboundMessage::JoinMeeting {
        meeting_id: "m1".to_string(),
    };

    let json = msg.encode().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value, serde_json::json!({"type": "join_meeting", "meeting_id": "m1"}));
}

#[test]
fn test_ping_frame_has_only_type() {
    let json = OutboundMessage::Ping.encode().unwrap();
    assert_eq!(json, r#"{"type":"ping"}"#);
}

#[test]
fn test_audio_frame_carries_base64_pcm() {
    let samples: Vec<i16> = vec![100, -200, 300, -400];
    let pcm_bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    let msg = OutboundMessage::audio_frame("m1", &pcm_bytes);
    let frame: OutboundFrame = serde_json::from_str(&msg.encode().unwrap()).unwrap();

    assert_eq!(frame.kind, "audio_data");
    assert_eq!(frame.meeting_id.as_deref(), Some("m1"));

    let encoded = frame.audio_data.expect("audio_data field");
    assert_eq!(frame.data, Some(serde_json::Value::String(encoded.clone())));

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&encoded)
        .unwrap();
    assert_eq!(decoded, pcm_bytes);
}

#[test]
fn test_transcript_event_segment() {
    let raw = r#"{
        "type": "transcript",
        "meeting_id": "m1",
        "data": {
            "id": "seg-1",
            "speaker": "Alice",
            "text": "Hello world",
            "timestamp": 12.5,
            "confidence": 0.95
        }
    }"#;

    let InboundEvent::Transcript(event) = InboundEvent::parse(raw).unwrap() else {
        panic!("expected transcript");
    };

    let segment = event.segment().expect("segment payload");
    assert_eq!(segment.id.as_deref(), Some("seg-1"));
    assert_eq!(segment.meeting_id.as_deref(), Some("m1"));
    assert_eq!(segment.speaker.as_deref(), Some("Alice"));
    assert_eq!(segment.text, "Hello world");
    assert_eq!(segment.confidence, Some(0.95));
    assert!(segment.is_final);
}

#[test]
fn test_transcript_without_segment_shape() {
    let event = InboundEvent::parse(r#"{"type":"transcript","data":{"foo":1}}"#).unwrap();

    let InboundEvent::Transcript(event) = event else {
        panic!("expected transcript");
    };
    assert!(event.segment().is_none());
}

#[test]
fn test_status_event_ignores_extra_fields() {
    let raw = r#"{"type":"meeting_ended","meeting_id":"m1","summary":{"text":"done"}}"#;

    match InboundEvent::parse(raw).unwrap() {
        InboundEvent::Status(status) => {
            assert_eq!(status.kind, StatusKind::MeetingEnded);
            assert_eq!(status.meeting_id.as_deref(), Some("m1"));
            assert_eq!(status.message, None);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_unknown_type_parses() {
    let event = InboundEvent::parse(r#"{"type":"unknown_x"}"#).unwrap();
    assert_eq!(event, InboundEvent::Unknown("unknown_x".to_string()));
}

#[test]
fn test_pong_keeps_timestamp() {
    let event = InboundEvent::parse(r#"{"type":"pong","timestamp":"2025-10-27T14:30:05"}"#).unwrap();
    assert_eq!(
        event,
        InboundEvent::Pong {
            timestamp: Some("2025-10-27T14:30:05".to_string())
        }
    );
}

#[test]
fn test_malformed_frame_is_error() {
    assert!(InboundEvent::parse("not json").is_err());
    assert!(InboundEvent::parse(r#"{"message":"no type"}"#).is_err());
}

#[test]
fn test_encoded_messages_decode_back() {
    let messages = vec![
        OutboundMessage::JoinMeeting {
            meeting_id: "m1".to_string(),
        },
        OutboundMessage::StopRecording {
            meeting_id: "m1".to_string(),
        },
        OutboundMessage::audio_frame("m1", &[1, 2, 3, 4]),
        OutboundMessage::Ping,
    ];

    for message in messages {
        let raw = message.encode().unwrap();
        assert_eq!(OutboundMessage::decode(&raw).unwrap(), message);
    }
}

#[test]
fn test_decode_rejects_foreign_frames() {
    assert!(OutboundMessage::decode(r#"{"type":"transcript","meeting_id":"m1"}"#).is_err());
    assert!(OutboundMessage::decode(r#"{"type":"join_meeting"}"#).is_err());
    assert!(OutboundMessage::decode(r#"{"type":"audio_data","meeting_id":"m1"}"#).is_err());
    assert!(OutboundMessage::decode("not json").is_err());
}
