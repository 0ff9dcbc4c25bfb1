//! Entity models for the watchpost surveillance platform.
//!
//! These mirror the JSON shapes served by the backend REST API. Every entity
//! carries `created_at`/`updated_at` server timestamps; the pair doubles as
//! the version marker used to order conflicting writes (see [`Versioned`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record with a stable numeric identity and a comparable version marker.
///
/// The reconciliation store only accepts a write for an id when the incoming
/// version is not older than the one it already holds, regardless of whether
/// the write arrived over the stream or from a REST response.
pub trait Versioned {
    fn entity_id(&self) -> i64;
    fn version(&self) -> DateTime<Utc>;
}

fn version_of(created_at: DateTime<Utc>, updated_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    updated_at.unwrap_or(created_at)
}

// --- Cameras ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default = "default_rtsp_port")]
    pub port: u16,
    #[serde(default)]
    pub stream_url: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default)]
    pub detection_enabled: bool,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_motion_sensitivity")]
    pub motion_sensitivity: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default, with = "crate::time::utc_opt")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(with = "crate::time::utc")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::time::utc_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_rtsp_port() -> u16 {
    554
}

fn default_resolution() -> String {
    "1920x1080".to_string()
}

fn default_frame_rate() -> u32 {
    30
}

fn default_codec() -> String {
    "H.264".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_motion_sensitivity() -> f64 {
    0.5
}

impl Camera {
    /// Skeleton record for a camera first seen through a partial status
    /// update, before any baseline fetch has provided the full row.
    pub fn placeholder(id: i64, seen_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: String::new(),
            description: None,
            location: String::new(),
            ip_address: String::new(),
            port: default_rtsp_port(),
            stream_url: String::new(),
            resolution: default_resolution(),
            frame_rate: default_frame_rate(),
            codec: default_codec(),
            detection_enabled: false,
            confidence_threshold: default_confidence_threshold(),
            motion_sensitivity: default_motion_sensitivity(),
            is_active: false,
            is_online: false,
            last_heartbeat: None,
            last_error: None,
            created_at: seen_at,
            updated_at: None,
        }
    }
}

impl Versioned for Camera {
    fn entity_id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> DateTime<Utc> {
        version_of(self.created_at, self.updated_at)
    }
}

/// Partial camera status pushed over the stream. Only the fields present in
/// the payload are merged into the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraStatusUpdate {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::time::utc_opt"
    )]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_enabled: Option<bool>,
}

/// Snapshot returned by `GET /cameras/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraStatus {
    pub id: i64,
    pub name: String,
    pub is_online: bool,
    #[serde(default, with = "crate::time::utc_opt")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    pub detection_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: String,
    pub ip_address: String,
    #[serde(default = "default_rtsp_port")]
    pub port: u16,
    pub stream_url: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default)]
    pub detection_enabled: bool,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_motion_sensitivity")]
    pub motion_sensitivity: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CameraUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_sensitivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraStats {
    pub id: i64,
    pub name: String,
    pub total_detections: u64,
    pub total_alerts: u64,
    pub false_positives: u64,
    pub accuracy_rate: f64,
    pub uptime_percentage: f64,
    #[serde(default, with = "crate::time::utc_opt")]
    pub last_detection: Option<DateTime<Utc>>,
}

// --- Detections ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub id: i64,
    pub camera_id: i64,
    pub detection_type: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub anomaly_score: Option<f64>,
    #[serde(default)]
    pub bounding_box: Option<serde_json::Value>,
    #[serde(with = "crate::time::utc")]
    pub frame_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub frame_number: Option<u64>,
    #[serde(default)]
    pub object_class: Option<String>,
    #[serde(default)]
    pub behavior_type: Option<String>,
    #[serde(default = "default_risk_level")]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_false_positive: bool,
    #[serde(default)]
    pub verification_notes: Option<String>,
    #[serde(with = "crate::time::utc")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::time::utc_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_risk_level() -> RiskLevel {
    RiskLevel::Medium
}

impl Versioned for Detection {
    fn entity_id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> DateTime<Utc> {
        version_of(self.created_at, self.updated_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionCreate {
    pub camera_id: i64,
    pub detection_type: String,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<serde_json::Value>,
    #[serde(with = "crate::time::utc")]
    pub frame_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_type: Option<String>,
    #[serde(default = "default_risk_level")]
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_false_positive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionStats {
    pub total_detections: u64,
    pub verified_detections: u64,
    pub false_positives: u64,
    pub accuracy_rate: f64,
    pub detections_by_type: std::collections::HashMap<String, u64>,
    pub detections_by_risk_level: std::collections::HashMap<String, u64>,
    pub average_confidence: f64,
    pub detections_last_24h: u64,
    pub detections_last_7d: u64,
}

// --- Alerts ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Acknowledged,
    Resolved,
    FalsePositive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: i64,
    pub camera_id: i64,
    #[serde(default)]
    pub detection_id: Option<i64>,
    pub alert_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_alert_priority")]
    pub priority: AlertPriority,
    #[serde(default = "default_alert_status")]
    pub status: AlertStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, with = "crate::time::utc_opt")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub resolution_notes: Option<String>,
    #[serde(with = "crate::time::utc")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "crate::time::utc_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_alert_priority() -> AlertPriority {
    AlertPriority::Medium
}

fn default_alert_status() -> AlertStatus {
    AlertStatus::Pending
}

impl Versioned for Alert {
    fn entity_id(&self) -> i64 {
        self.id
    }

    fn version(&self) -> DateTime<Utc> {
        version_of(self.created_at, self.updated_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertCreate {
    pub camera_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_id: Option<i64>,
    pub alert_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_alert_priority")]
    pub priority: AlertPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AlertPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertStats {
    pub total_alerts: u64,
    pub pending_alerts: u64,
    pub resolved_alerts: u64,
    pub false_positive_alerts: u64,
    pub alerts_by_priority: std::collections::HashMap<String, u64>,
    pub alerts_by_status: std::collections::HashMap<String, u64>,
    pub alerts_by_type: std::collections::HashMap<String, u64>,
    #[serde(default)]
    pub average_resolution_time_minutes: Option<f64>,
    pub alerts_last_24h: u64,
    pub alerts_last_7d: u64,
}

/// Generic `{"status": ..., "message": ...}` acknowledgement returned by
/// action endpoints (acknowledge, resolve, verify, test-connection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusMessage {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

// --- Auth ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn version_prefers_updated_at() {
        let mut camera = Camera::placeholder(1, ts(100));
        assert_eq!(camera.version(), ts(100));
        camera.updated_at = Some(ts(200));
        assert_eq!(camera.version(), ts(200));
    }

    #[test]
    fn alert_status_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&AlertStatus::FalsePositive).unwrap();
        assert_eq!(json, "\"false_positive\"");
        let parsed: AlertStatus = serde_json::from_str("\"acknowledged\"").unwrap();
        assert_eq!(parsed, AlertStatus::Acknowledged);
    }

    #[test]
    fn detection_deserializes_with_missing_optionals() {
        let raw = r#"{
            "id": 9,
            "camera_id": 2,
            "detection_type": "intrusion",
            "confidence_score": 0.91,
            "frame_timestamp": "2026-05-01T12:00:00Z",
            "created_at": "2026-05-01T12:00:01Z"
        }"#;
        let det: Detection = serde_json::from_str(raw).unwrap();
        assert_eq!(det.risk_level, RiskLevel::Medium);
        assert!(!det.is_verified);
        assert_eq!(det.version(), det.created_at);
    }

    #[test]
    fn camera_accepts_offsetless_timestamps() {
        let raw = r#"{
            "id": 1,
            "name": "north gate",
            "created_at": "2026-08-26T12:00:00.123456",
            "updated_at": "2026-08-26T12:05:00",
            "last_heartbeat": "2026-08-26T12:04:58"
        }"#;
        let camera: Camera = serde_json::from_str(raw).unwrap();
        assert_eq!(
            camera.created_at,
            Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
                + chrono::Duration::microseconds(123_456)
        );
        assert_eq!(
            camera.version(),
            Utc.with_ymd_and_hms(2026, 8, 26, 12, 5, 0).unwrap()
        );
        assert!(camera.last_heartbeat.is_some());
    }
}
