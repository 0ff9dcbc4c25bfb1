//! Stream protocol definitions for the dashboard WebSocket feed.
//!
//! Inbound messages are JSON envelopes:
//!
//! ```json
//! { "type": "new_alert", "data": { ... }, "timestamp": "...", "source": "ai-engine" }
//! ```
//!
//! The `type` discriminator is kept open: envelopes with an unrecognized type
//! are preserved as [`StreamPayload::Unknown`] instead of being dropped, so a
//! decoder can fail closed per-message without losing observability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Alert, CameraStatusUpdate, Detection};

pub const EVENT_VIDEO_FRAME: &str = "video_frame";
pub const EVENT_NEW_DETECTION: &str = "new_detection";
pub const EVENT_NEW_ALERT: &str = "new_alert";
pub const EVENT_CAMERA_STATUS: &str = "camera_status_update";

/// Raw wire envelope, before payload classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    #[serde(with = "crate::time::utc")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A single frame from a camera's live feed. Display-only: frames never
/// mutate entity state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoFrame {
    pub camera_id: i64,
    /// Base64-encoded JPEG.
    pub frame_data: String,
    #[serde(default)]
    pub frame_number: Option<u64>,
}

/// Classified payload of a stream event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StreamPayload {
    VideoFrame(VideoFrame),
    NewDetection(Detection),
    NewAlert(Alert),
    CameraStatus(CameraStatusUpdate),
    /// Envelope with a `type` we do not recognize (including service
    /// messages like `heartbeat`). Preserved verbatim for diagnostics.
    Unknown { kind: String, data: Value },
}

/// A decoded server-pushed event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamEvent {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub payload: StreamPayload,
}

impl StreamEvent {
    /// The wire-level `type` tag this event was delivered with.
    pub fn kind(&self) -> &str {
        match &self.payload {
            StreamPayload::VideoFrame(_) => EVENT_VIDEO_FRAME,
            StreamPayload::NewDetection(_) => EVENT_NEW_DETECTION,
            StreamPayload::NewAlert(_) => EVENT_NEW_ALERT,
            StreamPayload::CameraStatus(_) => EVENT_CAMERA_STATUS,
            StreamPayload::Unknown { kind, .. } => kind,
        }
    }
}

/// Outbound message sent by the client over the stream. The server assumes
/// no acknowledgement protocol; sends are best-effort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Subscribe { channel: String },
    Unsubscribe { channel: String },
}
