//! Inbound message classification.
//!
//! The decoder is total over well-formed envelopes: recognized `type` tags
//! produce typed payloads, anything else is preserved as
//! [`StreamPayload::Unknown`]. Only a malformed envelope or a malformed
//! payload for a known tag is an error, and the caller handles that by
//! discarding the single message.

use serde::de::DeserializeOwned;
use serde_json::Value;

use watchpost_shared::{
    DecodeError, StreamEnvelope, StreamEvent, StreamPayload, EVENT_CAMERA_STATUS, EVENT_NEW_ALERT,
    EVENT_NEW_DETECTION, EVENT_VIDEO_FRAME,
};

/// Decode one raw text frame into a typed stream event.
pub fn decode(raw: &str) -> Result<StreamEvent, DecodeError> {
    let envelope: StreamEnvelope = serde_json::from_str(raw).map_err(DecodeError::Envelope)?;
    let StreamEnvelope {
        kind,
        data,
        timestamp,
        source,
    } = envelope;

    let payload = match kind.as_str() {
        EVENT_VIDEO_FRAME => StreamPayload::VideoFrame(payload(&kind, data)?),
        EVENT_NEW_DETECTION => StreamPayload::NewDetection(payload(&kind, data)?),
        EVENT_NEW_ALERT => StreamPayload::NewAlert(payload(&kind, data)?),
        EVENT_CAMERA_STATUS => StreamPayload::CameraStatus(payload(&kind, data)?),
        _ => StreamPayload::Unknown { kind, data },
    };

    Ok(StreamEvent {
        timestamp,
        source,
        payload,
    })
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError::Payload {
        kind: kind.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchpost_shared::AlertStatus;

    #[test]
    fn rejects_malformed_json() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Envelope(_)));
    }

    #[test]
    fn rejects_known_kind_with_malformed_payload() {
        let raw = r#"{
            "type": "new_alert",
            "data": { "id": "not-a-number" },
            "timestamp": "2026-06-01T08:00:00Z"
        }"#;
        let err = decode(raw).unwrap_err();
        match err {
            DecodeError::Payload { kind, .. } => assert_eq!(kind, "new_alert"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decodes_new_alert() {
        let raw = r#"{
            "type": "new_alert",
            "data": {
                "id": 42,
                "camera_id": 7,
                "alert_type": "intrusion",
                "title": "Perimeter breach",
                "status": "pending",
                "priority": "high",
                "created_at": "2026-06-01T08:00:00Z"
            },
            "timestamp": "2026-06-01T08:00:01Z",
            "source": "ai-engine"
        }"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.source.as_deref(), Some("ai-engine"));
        match event.payload {
            StreamPayload::NewAlert(alert) => {
                assert_eq!(alert.id, 42);
                assert_eq!(alert.status, AlertStatus::Pending);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn preserves_unknown_kinds() {
        let raw = r#"{
            "type": "heartbeat",
            "data": { "uptime": 123 },
            "timestamp": "2026-06-01T08:00:00Z"
        }"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.kind(), "heartbeat");
        match event.payload {
            StreamPayload::Unknown { kind, data } => {
                assert_eq!(kind, "heartbeat");
                assert_eq!(data["uptime"], 123);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn decodes_offsetless_timestamps_as_utc() {
        // The server stamps envelopes and entities with naive UTC datetimes.
        let raw = r#"{
            "type": "new_alert",
            "data": {
                "id": 42,
                "camera_id": 7,
                "alert_type": "intrusion",
                "title": "Perimeter breach",
                "status": "pending",
                "created_at": "2026-08-26T12:00:00.123456"
            },
            "timestamp": "2026-08-26T12:00:01.654321"
        }"#;
        let event = decode(raw).unwrap();
        assert_eq!(
            event.timestamp,
            watchpost_shared::time::parse("2026-08-26T12:00:01.654321Z").unwrap()
        );
        match event.payload {
            StreamPayload::NewAlert(alert) => assert_eq!(alert.id, 42),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn decodes_partial_camera_status() {
        let raw = r#"{
            "type": "camera_status_update",
            "data": { "id": 7, "is_online": false },
            "timestamp": "2026-06-01T08:00:00Z"
        }"#;
        let event = decode(raw).unwrap();
        match event.payload {
            StreamPayload::CameraStatus(update) => {
                assert_eq!(update.id, 7);
                assert_eq!(update.is_online, Some(false));
                assert_eq!(update.last_error, None);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
