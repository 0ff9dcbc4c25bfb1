//! Reconciliation store: the authoritative in-memory state.
//!
//! One merge rule covers every write, whether it arrived over the stream or
//! from a REST response: last-writer-wins by version marker, not by arrival
//! order. A slow REST response can therefore never undo a fresher push
//! update, and vice versa.
//!
//! Subscribers read cloned snapshots and watch a revision counter for
//! change notification; all mutation goes through the methods here.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;

use watchpost_shared::{
    Alert, Camera, CameraStatus, CameraStatusUpdate, Detection, StreamEvent, StreamPayload,
    Versioned,
};

use crate::ws::ConnectionState;

/// Diagnostics ring buffer cap. Oldest entries are evicted first.
pub const EVENT_LOG_CAP: usize = 100;

/// Cap on the most-recent-first display lists for detections and alerts.
pub const RECENT_LIST_CAP: usize = 500;

/// Result of applying a write through the merge rule.
///
/// `Stale` is deliberately not an error: it is the silent no-op taken when
/// the incoming version marker is older than the one already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
    Stale,
    /// The event carried no entity mutation (video frame, unknown kind).
    LoggedOnly,
    /// The store has been torn down; the write was refused.
    Closed,
}

impl MergeOutcome {
    /// Whether the write mutated entity state.
    pub fn changed(self) -> bool {
        matches!(self, MergeOutcome::Inserted | MergeOutcome::Updated)
    }

    fn batch(changed: bool) -> Self {
        if changed {
            MergeOutcome::Updated
        } else {
            MergeOutcome::Stale
        }
    }
}

#[derive(Default)]
struct StoreInner {
    cameras: HashMap<i64, Camera>,
    detections: HashMap<i64, Detection>,
    alerts: HashMap<i64, Alert>,
    /// Display-ordered ids, most recent first. Distinct from the id-keyed
    /// maps; a derived property, not authoritative state.
    recent_detections: Vec<i64>,
    recent_alerts: Vec<i64>,
    events: VecDeque<StreamEvent>,
    connection: ConnectionState,
    closed: bool,
}

/// Shared state for cameras, detections, alerts and connection status.
pub struct SyncStore {
    inner: RwLock<StoreInner>,
    revision: watch::Sender<u64>,
}

impl Default for SyncStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: RwLock::new(StoreInner::default()),
            revision,
        }
    }

    /// Receiver that observes the store revision; it ticks after every
    /// applied change, synchronously with the mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    // --- Stream-sourced writes ---

    /// Apply one decoded stream event. The event is appended to the event
    /// log whether or not it changed entity state.
    pub fn apply_event(&self, event: StreamEvent) -> MergeOutcome {
        let mut inner = self.inner.write();
        if inner.closed {
            return MergeOutcome::Closed;
        }

        let outcome = match &event.payload {
            StreamPayload::NewDetection(detection) => {
                upsert_detection(&mut inner, detection.clone())
            }
            StreamPayload::NewAlert(alert) => upsert_alert(&mut inner, alert.clone()),
            StreamPayload::CameraStatus(update) => {
                merge_camera_status(&mut inner, update, event.timestamp)
            }
            StreamPayload::VideoFrame(_) | StreamPayload::Unknown { .. } => {
                MergeOutcome::LoggedOnly
            }
        };

        inner.events.push_back(event);
        while inner.events.len() > EVENT_LOG_CAP {
            inner.events.pop_front();
        }

        drop(inner);
        self.bump();
        outcome
    }

    // --- REST-sourced writes (same merge rule) ---

    pub fn apply_camera(&self, camera: Camera) -> MergeOutcome {
        self.mutate(|inner| upsert_camera(inner, camera))
    }

    pub fn apply_cameras(&self, cameras: Vec<Camera>) {
        self.mutate(|inner| {
            let mut changed = false;
            for camera in cameras {
                changed |= upsert_camera(inner, camera).changed();
            }
            MergeOutcome::batch(changed)
        });
    }

    /// Merge a fetched status snapshot as a partial update versioned by the
    /// fetch time.
    pub fn apply_camera_status(&self, status: &CameraStatus, seen_at: DateTime<Utc>) -> MergeOutcome {
        let update = CameraStatusUpdate {
            id: status.id,
            name: Some(status.name.clone()),
            is_online: Some(status.is_online),
            last_heartbeat: status.last_heartbeat,
            last_error: status.last_error.clone(),
            detection_enabled: Some(status.detection_enabled),
        };
        self.mutate(|inner| merge_camera_status(inner, &update, seen_at))
    }

    pub fn apply_detection(&self, detection: Detection) -> MergeOutcome {
        self.mutate(|inner| upsert_detection(inner, detection))
    }

    /// Apply a fetched list. Iterated in reverse so that a server-ordered
    /// (most recent first) page lands in the recency list in that order.
    pub fn apply_detections(&self, detections: Vec<Detection>) {
        self.mutate(|inner| {
            let mut changed = false;
            for detection in detections.into_iter().rev() {
                changed |= upsert_detection(inner, detection).changed();
            }
            MergeOutcome::batch(changed)
        });
    }

    pub fn apply_alert(&self, alert: Alert) -> MergeOutcome {
        self.mutate(|inner| upsert_alert(inner, alert))
    }

    pub fn apply_alerts(&self, alerts: Vec<Alert>) {
        self.mutate(|inner| {
            let mut changed = false;
            for alert in alerts.into_iter().rev() {
                changed |= upsert_alert(inner, alert).changed();
            }
            MergeOutcome::batch(changed)
        });
    }

    // --- Deletes (explicit responses only; a silent stream never removes) ---

    pub fn remove_camera(&self, id: i64) -> bool {
        let mut inner = self.inner.write();
        if inner.closed {
            return false;
        }
        let removed = inner.cameras.remove(&id).is_some();
        drop(inner);
        if removed {
            self.bump();
        }
        removed
    }

    pub fn remove_detection(&self, id: i64) -> bool {
        let mut inner = self.inner.write();
        if inner.closed {
            return false;
        }
        let removed = inner.detections.remove(&id).is_some();
        inner.recent_detections.retain(|&d| d != id);
        drop(inner);
        if removed {
            self.bump();
        }
        removed
    }

    pub fn remove_alert(&self, id: i64) -> bool {
        let mut inner = self.inner.write();
        if inner.closed {
            return false;
        }
        let removed = inner.alerts.remove(&id).is_some();
        inner.recent_alerts.retain(|&a| a != id);
        drop(inner);
        if removed {
            self.bump();
        }
        removed
    }

    // --- Connection status ---

    pub fn set_connection_state(&self, state: ConnectionState) {
        let mut inner = self.inner.write();
        if inner.closed || inner.connection == state {
            return;
        }
        tracing::debug!("connection state: {:?} -> {:?}", inner.connection, state);
        inner.connection = state;
        drop(inner);
        self.bump();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.read().connection.clone()
    }

    // --- Lifecycle ---

    /// Tear the store down (logout / page teardown). All subsequent writes
    /// are refused; the channel must be disconnected by the caller.
    pub fn close(&self) {
        let mut inner = self.inner.write();
        inner.closed = true;
        inner.connection = ConnectionState::Disconnected;
        drop(inner);
        self.bump();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    // --- Snapshots (read-only) ---

    pub fn camera(&self, id: i64) -> Option<Camera> {
        self.inner.read().cameras.get(&id).cloned()
    }

    /// All cameras, ordered by id. Display ordering is derived, not stored.
    pub fn cameras(&self) -> Vec<Camera> {
        let inner = self.inner.read();
        let mut cameras: Vec<Camera> = inner.cameras.values().cloned().collect();
        cameras.sort_by_key(|c| c.id);
        cameras
    }

    pub fn detection(&self, id: i64) -> Option<Detection> {
        self.inner.read().detections.get(&id).cloned()
    }

    /// Detections in most-recent-first display order.
    pub fn recent_detections(&self) -> Vec<Detection> {
        let inner = self.inner.read();
        inner
            .recent_detections
            .iter()
            .filter_map(|id| inner.detections.get(id).cloned())
            .collect()
    }

    pub fn alert(&self, id: i64) -> Option<Alert> {
        self.inner.read().alerts.get(&id).cloned()
    }

    /// Alerts in most-recent-first display order.
    pub fn recent_alerts(&self) -> Vec<Alert> {
        let inner = self.inner.read();
        inner
            .recent_alerts
            .iter()
            .filter_map(|id| inner.alerts.get(id).cloned())
            .collect()
    }

    /// The bounded diagnostics log, oldest first.
    pub fn events(&self) -> Vec<StreamEvent> {
        self.inner.read().events.iter().cloned().collect()
    }

    fn mutate(&self, f: impl FnOnce(&mut StoreInner) -> MergeOutcome) -> MergeOutcome {
        let mut inner = self.inner.write();
        if inner.closed {
            return MergeOutcome::Closed;
        }
        let outcome = f(&mut inner);
        drop(inner);
        // Stale writes mutate nothing; subscribers are not woken for them.
        if outcome.changed() {
            self.bump();
        }
        outcome
    }
}

fn upsert_camera(inner: &mut StoreInner, camera: Camera) -> MergeOutcome {
    match inner.cameras.get(&camera.id) {
        Some(held) if camera.version() < held.version() => {
            tracing::debug!("stale camera {} write ignored", camera.id);
            MergeOutcome::Stale
        }
        Some(_) => {
            inner.cameras.insert(camera.id, camera);
            MergeOutcome::Updated
        }
        None => {
            inner.cameras.insert(camera.id, camera);
            MergeOutcome::Inserted
        }
    }
}

fn upsert_detection(inner: &mut StoreInner, detection: Detection) -> MergeOutcome {
    let id = detection.id;
    match inner.detections.get(&id) {
        Some(held) if detection.version() < held.version() => {
            tracing::debug!("stale detection {id} write ignored");
            MergeOutcome::Stale
        }
        Some(_) => {
            inner.detections.insert(id, detection);
            MergeOutcome::Updated
        }
        None => {
            inner.detections.insert(id, detection);
            push_recent(&mut inner.recent_detections, id);
            MergeOutcome::Inserted
        }
    }
}

fn upsert_alert(inner: &mut StoreInner, alert: Alert) -> MergeOutcome {
    let id = alert.id;
    match inner.alerts.get(&id) {
        Some(held) if alert.version() < held.version() => {
            tracing::debug!("stale alert {id} write ignored");
            MergeOutcome::Stale
        }
        Some(_) => {
            inner.alerts.insert(id, alert);
            MergeOutcome::Updated
        }
        None => {
            inner.alerts.insert(id, alert);
            push_recent(&mut inner.recent_alerts, id);
            MergeOutcome::Inserted
        }
    }
}

fn push_recent(list: &mut Vec<i64>, id: i64) {
    list.insert(0, id);
    list.truncate(RECENT_LIST_CAP);
}

/// Partial merge: only the fields present in the payload are applied. A
/// status update for an unseen camera creates a placeholder record rather
/// than erroring.
fn merge_camera_status(
    inner: &mut StoreInner,
    update: &CameraStatusUpdate,
    event_time: DateTime<Utc>,
) -> MergeOutcome {
    let (mut camera, existed) = match inner.cameras.get(&update.id) {
        Some(held) => {
            if event_time < held.version() {
                tracing::debug!("stale status for camera {} ignored", update.id);
                return MergeOutcome::Stale;
            }
            (held.clone(), true)
        }
        None => (Camera::placeholder(update.id, event_time), false),
    };

    if let Some(name) = &update.name {
        camera.name = name.clone();
    }
    if let Some(is_online) = update.is_online {
        camera.is_online = is_online;
    }
    if let Some(heartbeat) = update.last_heartbeat {
        camera.last_heartbeat = Some(heartbeat);
    }
    if let Some(error) = &update.last_error {
        camera.last_error = Some(error.clone());
    }
    if let Some(enabled) = update.detection_enabled {
        camera.detection_enabled = enabled;
    }
    camera.updated_at = Some(event_time);

    inner.cameras.insert(update.id, camera);
    if existed {
        MergeOutcome::Updated
    } else {
        MergeOutcome::Inserted
    }
}
