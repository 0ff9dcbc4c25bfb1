//! watchpost-client — headless dashboard tail.
//!
//! Connects to the backend, loads the camera/alert baselines and prints a
//! summary every time the synchronized state changes. Useful for smoke
//! testing a deployment without the UI.

use anyhow::Result;
use watchpost_client::{logging, ClientConfig, SyncClient};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = ClientConfig::from_env();
    tracing::info!("connecting to {}", config.base_url);

    let client = SyncClient::new(config);
    client.connect();

    // Baseline fetches; stream deltas reconcile on top of these.
    if let Err(err) = client.gateway().list_cameras().await {
        tracing::warn!("camera baseline fetch failed: {err}");
    }
    if let Err(err) = client.gateway().list_alerts().await {
        tracing::warn!("alert baseline fetch failed: {err}");
    }

    let store = client.store().clone();
    let mut revision = store.subscribe();

    loop {
        revision.changed().await?;
        let cameras = store.cameras();
        let online = cameras.iter().filter(|c| c.is_online).count();
        println!(
            "[{:?}] cameras: {online}/{} online, detections: {}, alerts: {}, log: {}",
            store.connection_state(),
            cameras.len(),
            store.recent_detections().len(),
            store.recent_alerts().len(),
            store.events().len(),
        );
    }
}
