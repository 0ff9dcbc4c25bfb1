//! Stream transport: one WebSocket connection with auto-reconnect.
//!
//! The channel owns no business logic. It reports its state into the
//! [`SyncStore`], hands every inbound text frame to the decoder, and drains
//! an outbound queue while a session is up. Loss of the connection schedules
//! exactly one reconnect timer per the injected [`RetryPolicy`];
//! `disconnect()` cancels it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use watchpost_shared::ClientMessage;

use super::decoder;
use crate::store::SyncStore;

/// Connection state of the stream channel. Written only by the channel
/// itself; read by everyone through the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Errored {
        reason: String,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Reconnect policy, decoupled from the channel mechanism.
///
/// The default matches the reference dashboard: retry forever at a fixed
/// 5 second interval. Deployments that need backoff or a retry ceiling
/// configure one here.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f32,
    pub jitter: bool,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Retry forever at a fixed interval.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_delay: interval,
            max_delay: interval,
            multiplier: 1.0,
            jitter: false,
            max_attempts: None,
        }
    }

    /// Exponential backoff with a delay cap.
    pub fn backoff(initial: Duration, max: Duration, multiplier: f32) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max,
            multiplier,
            jitter: false,
            max_attempts: None,
        }
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Delay before reconnect attempt number `attempt` (zero-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f32 * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f32);
        let millis = if self.jitter {
            capped * rand::thread_rng().gen_range(0.5..1.5)
        } else {
            capped
        };
        Duration::from_millis(millis as u64)
    }
}

struct ChannelTask {
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

/// Store handle scoped to one connection task. A superseded task (a newer
/// `connect()` bumped the generation) still unwinds, but must not report
/// state for a connection it no longer owns.
struct StateGate {
    store: Arc<SyncStore>,
    generation: Arc<AtomicU64>,
    task_generation: u64,
}

impl StateGate {
    fn set(&self, state: ConnectionState) {
        if self.generation.load(Ordering::SeqCst) == self.task_generation {
            self.store.set_connection_state(state);
        }
    }
}

/// Handle to the single stream connection.
pub struct StreamChannel {
    store: Arc<SyncStore>,
    url_builder: Arc<dyn Fn() -> String + Send + Sync>,
    retry: RetryPolicy,
    outbound_tx: UnboundedSender<ClientMessage>,
    outbound_rx: Arc<tokio::sync::Mutex<UnboundedReceiver<ClientMessage>>>,
    task: parking_lot::Mutex<Option<ChannelTask>>,
    generation: Arc<AtomicU64>,
}

impl StreamChannel {
    /// The URL builder is re-invoked on every attempt so a credential that
    /// changed between reconnects is picked up.
    pub fn new(
        store: Arc<SyncStore>,
        url_builder: impl Fn() -> String + Send + Sync + 'static,
        retry: RetryPolicy,
    ) -> Self {
        let (outbound_tx, outbound_rx) = unbounded();
        Self {
            store,
            url_builder: Arc::new(url_builder),
            retry,
            outbound_tx,
            outbound_rx: Arc::new(tokio::sync::Mutex::new(outbound_rx)),
            task: parking_lot::Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Open the connection. Idempotent: a no-op while a connection task is
    /// already running (Connecting or Connected).
    pub fn connect(&self) {
        let mut slot = self.task.lock();
        if let Some(task) = slot.as_ref() {
            if !task.handle.is_finished() {
                tracing::debug!("stream channel already active, ignoring connect");
                return;
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let gate = StateGate {
            store: self.store.clone(),
            generation: self.generation.clone(),
            task_generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        };
        let handle = tokio::spawn(run_loop(
            gate,
            self.url_builder.clone(),
            self.retry.clone(),
            self.outbound_rx.clone(),
            shutdown_rx,
        ));
        *slot = Some(ChannelTask {
            shutdown: shutdown_tx,
            handle,
        });
    }

    /// Enqueue an outbound message, best-effort. Dropped (with a log line)
    /// when the channel is not Connected; callers retry if they care.
    pub fn send(&self, message: ClientMessage) {
        if !self.store.connection_state().is_connected() {
            tracing::warn!("dropping outbound message, stream not connected");
            return;
        }
        if self.outbound_tx.unbounded_send(message).is_err() {
            tracing::warn!("dropping outbound message, connection task gone");
        }
    }

    /// Close the connection and cancel any pending reconnect timer.
    /// Idempotent and side-effect-free when already disconnected.
    pub fn disconnect(&self) {
        let mut slot = self.task.lock();
        let Some(task) = slot.take() else {
            tracing::debug!("stream channel already disconnected");
            return;
        };
        let _ = task.shutdown.send(true);
        // The task confirms on exit; set eagerly so callers observe the
        // transition immediately.
        self.store
            .set_connection_state(ConnectionState::Disconnected);
        tracing::info!("stream channel disconnected");
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            let _ = task.shutdown.send(true);
        }
    }
}

async fn run_loop(
    gate: StateGate,
    url_builder: Arc<dyn Fn() -> String + Send + Sync>,
    retry: RetryPolicy,
    outbound: Arc<tokio::sync::Mutex<UnboundedReceiver<ClientMessage>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt = 0u32;

    'outer: loop {
        let url = url_builder();
        gate.set(ConnectionState::Connecting);

        let connected = tokio::select! {
            res = connect_async(&url) => res,
            _ = shutdown.changed() => break 'outer,
        };

        match connected {
            Ok((ws, _response)) => {
                gate.set(ConnectionState::Connected);
                attempt = 0;
                tracing::info!("stream connected");

                let (mut write, mut read) = ws.split();
                let mut rx = outbound.lock().await;

                'session: loop {
                    tokio::select! {
                        inbound = read.next() => match inbound {
                            Some(Ok(Message::Text(text))) => {
                                match decoder::decode(text.as_str()) {
                                    Ok(event) => {
                                        gate.store.apply_event(event);
                                    }
                                    Err(err) => {
                                        tracing::warn!("discarding inbound message: {err}");
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::info!("stream closed by server");
                                break 'session;
                            }
                            // Ping/Pong handled by tungstenite; binary ignored.
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                tracing::error!("stream transport error: {err}");
                                gate.set(ConnectionState::Errored {
                                    reason: err.to_string(),
                                });
                                break 'session;
                            }
                        },
                        out = rx.next() => {
                            if let Some(message) = out {
                                match serde_json::to_string(&message) {
                                    Ok(json) => {
                                        tracing::debug!("stream send: {json}");
                                        if let Err(err) = write.send(Message::Text(json.into())).await {
                                            tracing::error!("stream send failed: {err}");
                                            break 'session;
                                        }
                                    }
                                    Err(err) => {
                                        tracing::error!("failed to serialize outbound message: {err}");
                                    }
                                }
                            }
                        }
                        _ = shutdown.changed() => {
                            let _ = write.send(Message::Close(None)).await;
                            break 'outer;
                        }
                    }
                }

                // Sends are best-effort: anything still queued does not
                // survive the session.
                while let Ok(Some(_)) = rx.try_next() {}
                drop(rx);
                gate.set(ConnectionState::Disconnected);
            }
            Err(err) => {
                tracing::error!("stream connect failed: {err}");
                gate.set(ConnectionState::Errored {
                    reason: err.to_string(),
                });
                gate.set(ConnectionState::Disconnected);
            }
        }

        // Exhausting the ceiling is terminal: the channel parks in Errored
        // until the next explicit connect().
        if let Some(max) = retry.max_attempts {
            if attempt >= max {
                gate.set(ConnectionState::Errored {
                    reason: format!("gave up after {max} reconnect attempts"),
                });
                return;
            }
        }

        // Exactly one reconnect timer in flight; disconnect() cancels it.
        let delay = retry.delay_for_attempt(attempt);
        tracing::info!("reconnecting in {delay:?} (attempt {})", attempt + 1);
        tokio::select! {
            _ = tokio::time::sleep(delay) => attempt += 1,
            _ = shutdown.changed() => break 'outer,
        }
    }

    gate.set(ConnectionState::Disconnected);
}
