//! watchpost-client — real-time state synchronization for the watchpost
//! operator dashboard.
//!
//! The crate keeps a persistent WebSocket stream to the backend, reconciles
//! pushed events with REST-fetched baselines under one version rule, and
//! exposes a consistent, bounded view of current truth through
//! [`store::SyncStore`]. UI layers are external subscribers: they read
//! store snapshots and issue gateway calls, nothing more.

pub mod api_client;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;
pub mod ws;

pub use api_client::ApiClient;
pub use config::ClientConfig;
pub use gateway::Gateway;
pub use session::Session;
pub use store::{MergeOutcome, SyncStore, EVENT_LOG_CAP};
pub use sync::SyncClient;
pub use ws::{ConnectionState, RetryPolicy, StreamChannel};
