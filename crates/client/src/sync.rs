//! Top-level handle wiring the store, stream channel and gateway together.

use std::sync::Arc;

use watchpost_shared::ClientMessage;

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::gateway::Gateway;
use crate::session::Session;
use crate::store::SyncStore;
use crate::ws::StreamChannel;

/// One synchronized dashboard session: created at login/startup, torn down
/// with [`SyncClient::shutdown`] on logout.
pub struct SyncClient {
    session: Session,
    store: Arc<SyncStore>,
    channel: StreamChannel,
    gateway: Gateway,
}

impl SyncClient {
    /// Client backed by the persisted session credential.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_session(config, Session::load())
    }

    pub fn with_session(config: ClientConfig, session: Session) -> Self {
        let store = Arc::new(SyncStore::new());
        let api = ApiClient::new(config.base_url.clone(), session.clone());
        let gateway = Gateway::new(api, store.clone());

        let retry = config.retry.clone();
        let url_session = session.clone();
        let channel = StreamChannel::new(
            store.clone(),
            move || config.stream_url(url_session.token().as_deref()),
            retry,
        );

        Self {
            session,
            store,
            channel,
            gateway,
        }
    }

    /// Open the stream connection. Idempotent.
    pub fn connect(&self) {
        self.channel.connect();
    }

    /// Close the stream connection, cancelling any pending reconnect.
    pub fn disconnect(&self) {
        self.channel.disconnect();
    }

    /// Best-effort outbound send over the stream.
    pub fn send(&self, message: ClientMessage) {
        self.channel.send(message);
    }

    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Tear down the session: the channel is closed and the store refuses
    /// all further mutation. In-flight REST calls are allowed to finish;
    /// their late results are discarded by the closed store.
    pub fn shutdown(&self) {
        self.channel.disconnect();
        self.store.close();
    }
}
