//! Gateway behavior against a mocked REST backend.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use watchpost_client::{ApiClient, Gateway, Session, SyncStore};
use watchpost_shared::{
    Alert, AlertCreate, AlertPriority, AlertStatus, ApiError, DetectionCreate, RiskLevel,
    StreamEvent, StreamPayload,
};

fn gateway_for(server: &MockServer) -> (Gateway, Arc<SyncStore>, Session) {
    let session = Session::new();
    session.login("operator", "test-token");
    let store = Arc::new(SyncStore::new());
    let api = ApiClient::new(server.uri(), session.clone());
    (Gateway::new(api, store.clone()), store, session)
}

fn alert_json(id: i64, status: &str, updated_at: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "camera_id": 7,
        "alert_type": "intrusion",
        "title": "Perimeter breach",
        "status": status,
        "priority": "high",
        "created_at": "2026-06-01T08:00:00Z",
        "updated_at": updated_at,
    })
}

fn stream_alert(id: i64, status: AlertStatus, updated_secs: Option<i64>) -> StreamEvent {
    let created_at = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
    StreamEvent {
        timestamp: created_at,
        source: None,
        payload: StreamPayload::NewAlert(Alert {
            id,
            camera_id: 7,
            detection_id: None,
            alert_type: "intrusion".into(),
            title: "Perimeter breach".into(),
            description: None,
            priority: AlertPriority::High,
            status,
            image_url: None,
            video_url: None,
            location: None,
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
            created_at,
            updated_at: updated_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        }),
    }
}

#[tokio::test]
async fn list_cameras_populates_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cameras/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "north gate", "created_at": "2026-06-01T00:00:00Z" },
            { "id": 2, "name": "south gate", "created_at": "2026-06-01T00:00:00Z" },
        ])))
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    let cameras = gateway.list_cameras().await.unwrap();

    assert_eq!(cameras.len(), 2);
    assert_eq!(store.camera(1).unwrap().name, "north gate");
    assert_eq!(store.camera(2).unwrap().name, "south gate");
}

#[tokio::test]
async fn acknowledge_refetches_and_merges_the_newer_version() {
    // Stream delivered alert 42 as pending; the acknowledge round-trip
    // re-fetches it with a newer marker. Final stored status must be
    // acknowledged.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/alerts/42/acknowledge"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "success", "message": "acknowledged" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/alerts/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(alert_json(42, "acknowledged", Some("2026-06-01T08:00:05Z"))),
        )
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    store.apply_event(stream_alert(42, AlertStatus::Pending, None));

    let alert = gateway.acknowledge_alert(42).await.unwrap();
    assert_eq!(alert.status, AlertStatus::Acknowledged);
    assert_eq!(store.alert(42).unwrap().status, AlertStatus::Acknowledged);
}

#[tokio::test]
async fn stale_fetch_cannot_clobber_a_fresher_stream_value() {
    let server = MockServer::start().await;
    // Server returns a snapshot older than what the stream already pushed.
    Mock::given(method("GET"))
        .and(path("/api/v1/alerts/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alert_json(42, "pending", None)))
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    store.apply_event(stream_alert(
        42,
        AlertStatus::Resolved,
        Some(1_800_000_000),
    ));

    let fetched = gateway.get_alert(42).await.unwrap();
    assert_eq!(fetched.status, AlertStatus::Pending);
    // the store kept the fresher stream value
    assert_eq!(store.alert(42).unwrap().status, AlertStatus::Resolved);
}

#[tokio::test]
async fn create_alert_merges_the_returned_entity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/alerts/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(alert_json(77, "pending", None)),
        )
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    let created = gateway
        .create_alert(&AlertCreate {
            camera_id: 7,
            detection_id: None,
            alert_type: "intrusion".into(),
            title: "Perimeter breach".into(),
            description: None,
            priority: AlertPriority::High,
            image_url: None,
            video_url: None,
            location: None,
        })
        .await
        .unwrap();

    assert_eq!(created.id, 77);
    assert_eq!(store.alert(77).unwrap().status, AlertStatus::Pending);
    assert_eq!(store.recent_alerts().len(), 1);
}

#[tokio::test]
async fn create_detection_merges_the_returned_entity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/detections/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 31,
            "camera_id": 7,
            "detection_type": "person",
            "confidence_score": 0.92,
            "frame_timestamp": "2026-08-26T12:00:00.123456",
            "created_at": "2026-08-26T12:00:00.200000"
        })))
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    let created = gateway
        .create_detection(&DetectionCreate {
            camera_id: 7,
            detection_type: "person".into(),
            confidence_score: 0.92,
            anomaly_score: None,
            bounding_box: None,
            frame_timestamp: Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap(),
            frame_number: None,
            object_class: Some("person".into()),
            behavior_type: None,
            risk_level: RiskLevel::High,
        })
        .await
        .unwrap();

    assert_eq!(created.id, 31);
    assert!(store.detection(31).is_some());
}

#[tokio::test]
async fn camera_status_merges_as_partial_update() {
    let server = MockServer::start().await;
    // offset-less heartbeat, as the server emits it
    Mock::given(method("GET"))
        .and(path("/api/v1/cameras/7/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "north gate",
            "is_online": true,
            "last_heartbeat": "2026-08-26T12:00:00.123456",
            "last_error": null,
            "detection_enabled": true
        })))
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    let status = gateway.camera_status(7).await.unwrap();

    assert!(status.is_online);
    let camera = store.camera(7).unwrap();
    assert_eq!(camera.name, "north gate");
    assert!(camera.is_online);
    assert!(camera.last_heartbeat.is_some());
}

#[tokio::test]
async fn unauthorized_clears_the_session_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cameras/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .mount(&server)
        .await;

    let (gateway, store, session) = gateway_for(&server);
    assert!(session.is_authenticated());

    let err = gateway.list_cameras().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!session.is_authenticated());
    assert!(store.cameras().is_empty());
}

#[tokio::test]
async fn failed_calls_leave_the_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/alerts/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    let err = gateway.list_alerts().await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 500, .. }));
    assert!(store.recent_alerts().is_empty());
}

#[tokio::test]
async fn delete_removes_the_entity_from_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/alerts/42"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (gateway, store, _) = gateway_for(&server);
    store.apply_event(stream_alert(42, AlertStatus::Pending, None));
    assert!(store.alert(42).is_some());

    gateway.delete_alert(42).await.unwrap();
    assert!(store.alert(42).is_none());
    assert!(store.recent_alerts().is_empty());
}

#[tokio::test]
async fn login_stores_the_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok-xyz", "token_type": "bearer" })),
        )
        .mount(&server)
        .await;

    let session = Session::new();
    let store = Arc::new(SyncStore::new());
    let gateway = Gateway::new(ApiClient::new(server.uri(), session.clone()), store);

    gateway.login("operator", "hunter2").await.unwrap();
    assert_eq!(session.token().as_deref(), Some("tok-xyz"));
    assert_eq!(session.username().as_deref(), Some("operator"));
}
