//! Command/query gateway: typed REST operations that feed the store.
//!
//! Every successful entity response is merged into the [`SyncStore`] through
//! the same version rule as streamed events, so REST mutations and push
//! events never race incoherently. Failed calls surface a typed error and
//! leave the store untouched.
//!
//! Action endpoints (acknowledge/resolve/verify/test-connection) return a
//! status message rather than the entity, so those operations re-fetch the
//! record afterwards to pick up its new version marker.

use std::sync::Arc;

use chrono::Utc;

use watchpost_shared::{
    Alert, AlertCreate, AlertStats, AlertUpdate, ApiError, Camera, CameraCreate, CameraStats,
    CameraStatus, CameraUpdate, Detection, DetectionCreate, DetectionStats, DetectionUpdate,
    LoginRequest, LoginResponse, StatusMessage,
};

use crate::api_client::ApiClient;
use crate::session::Session;
use crate::store::SyncStore;

#[derive(Clone)]
pub struct Gateway {
    api: ApiClient,
    store: Arc<SyncStore>,
}

impl Gateway {
    pub fn new(api: ApiClient, store: Arc<SyncStore>) -> Self {
        Self { api, store }
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    // --- Auth ---

    /// Authenticate and store the bearer credential in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let resp: LoginResponse = self
            .api
            .post_json(
                "/api/v1/auth/login",
                &LoginRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.session().login(username, resp.access_token);
        Ok(())
    }

    /// Clear the session credential. The server call is best-effort; the
    /// local credential is dropped either way.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .api
            .post_action::<StatusMessage>("/api/v1/auth/logout")
            .await;
        self.session().clear();
        result.map(|_| ())
    }

    // --- Cameras ---

    pub async fn list_cameras(&self) -> Result<Vec<Camera>, ApiError> {
        let cameras: Vec<Camera> = self.api.get_json("/api/v1/cameras/").await?;
        self.store.apply_cameras(cameras.clone());
        Ok(cameras)
    }

    pub async fn get_camera(&self, id: i64) -> Result<Camera, ApiError> {
        let camera: Camera = self.api.get_json(&format!("/api/v1/cameras/{id}")).await?;
        self.store.apply_camera(camera.clone());
        Ok(camera)
    }

    pub async fn create_camera(&self, create: &CameraCreate) -> Result<Camera, ApiError> {
        let camera: Camera = self.api.post_json("/api/v1/cameras/", create).await?;
        self.store.apply_camera(camera.clone());
        Ok(camera)
    }

    pub async fn update_camera(&self, id: i64, update: &CameraUpdate) -> Result<Camera, ApiError> {
        let camera: Camera = self
            .api
            .put_json(&format!("/api/v1/cameras/{id}"), update)
            .await?;
        self.store.apply_camera(camera.clone());
        Ok(camera)
    }

    pub async fn delete_camera(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v1/cameras/{id}")).await?;
        self.store.remove_camera(id);
        Ok(())
    }

    /// Current status snapshot, merged into the store as a partial update
    /// stamped with the fetch time.
    pub async fn camera_status(&self, id: i64) -> Result<CameraStatus, ApiError> {
        let status: CameraStatus = self
            .api
            .get_json(&format!("/api/v1/cameras/{id}/status"))
            .await?;
        self.store.apply_camera_status(&status, Utc::now());
        Ok(status)
    }

    pub async fn camera_stats(&self, id: i64) -> Result<CameraStats, ApiError> {
        self.api
            .get_json(&format!("/api/v1/cameras/{id}/stats"))
            .await
    }

    /// Ask the server to probe the camera's RTSP endpoint.
    pub async fn test_camera_connection(&self, id: i64) -> Result<StatusMessage, ApiError> {
        self.api
            .post_action(&format!("/api/v1/cameras/{id}/test-connection"))
            .await
    }

    // --- Detections ---

    pub async fn list_detections(&self) -> Result<Vec<Detection>, ApiError> {
        let detections: Vec<Detection> = self.api.get_json("/api/v1/detections/").await?;
        self.store.apply_detections(detections.clone());
        Ok(detections)
    }

    pub async fn create_detection(&self, create: &DetectionCreate) -> Result<Detection, ApiError> {
        let detection: Detection = self.api.post_json("/api/v1/detections/", create).await?;
        self.store.apply_detection(detection.clone());
        Ok(detection)
    }

    pub async fn get_detection(&self, id: i64) -> Result<Detection, ApiError> {
        let detection: Detection = self
            .api
            .get_json(&format!("/api/v1/detections/{id}"))
            .await?;
        self.store.apply_detection(detection.clone());
        Ok(detection)
    }

    pub async fn update_detection(
        &self,
        id: i64,
        update: &DetectionUpdate,
    ) -> Result<Detection, ApiError> {
        let detection: Detection = self
            .api
            .put_json(&format!("/api/v1/detections/{id}"), update)
            .await?;
        self.store.apply_detection(detection.clone());
        Ok(detection)
    }

    pub async fn delete_detection(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v1/detections/{id}")).await?;
        self.store.remove_detection(id);
        Ok(())
    }

    /// Mark a detection as human-verified, then re-fetch it so the store
    /// picks up the server's new version.
    pub async fn verify_detection(&self, id: i64) -> Result<Detection, ApiError> {
        let _: StatusMessage = self
            .api
            .post_action(&format!("/api/v1/detections/{id}/verify"))
            .await?;
        self.get_detection(id).await
    }

    pub async fn detection_stats(&self) -> Result<DetectionStats, ApiError> {
        self.api.get_json("/api/v1/detections/stats/overview").await
    }

    // --- Alerts ---

    pub async fn list_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        let alerts: Vec<Alert> = self.api.get_json("/api/v1/alerts/").await?;
        self.store.apply_alerts(alerts.clone());
        Ok(alerts)
    }

    pub async fn create_alert(&self, create: &AlertCreate) -> Result<Alert, ApiError> {
        let alert: Alert = self.api.post_json("/api/v1/alerts/", create).await?;
        self.store.apply_alert(alert.clone());
        Ok(alert)
    }

    pub async fn get_alert(&self, id: i64) -> Result<Alert, ApiError> {
        let alert: Alert = self.api.get_json(&format!("/api/v1/alerts/{id}")).await?;
        self.store.apply_alert(alert.clone());
        Ok(alert)
    }

    pub async fn update_alert(&self, id: i64, update: &AlertUpdate) -> Result<Alert, ApiError> {
        let alert: Alert = self
            .api
            .put_json(&format!("/api/v1/alerts/{id}"), update)
            .await?;
        self.store.apply_alert(alert.clone());
        Ok(alert)
    }

    pub async fn delete_alert(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/api/v1/alerts/{id}")).await?;
        self.store.remove_alert(id);
        Ok(())
    }

    pub async fn acknowledge_alert(&self, id: i64) -> Result<Alert, ApiError> {
        let _: StatusMessage = self
            .api
            .post_action(&format!("/api/v1/alerts/{id}/acknowledge"))
            .await?;
        self.get_alert(id).await
    }

    pub async fn resolve_alert(
        &self,
        id: i64,
        resolution_notes: Option<&str>,
        resolved_by: Option<&str>,
    ) -> Result<Alert, ApiError> {
        let mut path = format!("/api/v1/alerts/{id}/resolve");
        let mut query = Vec::new();
        if let Some(notes) = resolution_notes {
            query.push(format!("resolution_notes={}", urlencoding::encode(notes)));
        }
        if let Some(by) = resolved_by {
            query.push(format!("resolved_by={}", urlencoding::encode(by)));
        }
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        let _: StatusMessage = self.api.post_action(&path).await?;
        self.get_alert(id).await
    }

    pub async fn alert_stats(&self) -> Result<AlertStats, ApiError> {
        self.api.get_json("/api/v1/alerts/stats/overview").await
    }
}
