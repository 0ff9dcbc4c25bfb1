//! WebSocket transport for the real-time dashboard stream.
//!
//! Inbound flow: `StreamChannel` (connection + reconnect) feeds raw frames
//! to `decoder`, which classifies them into typed events applied to the
//! `SyncStore`. Subscribers read the store, never the socket.

pub mod connection;
pub mod decoder;

pub use connection::{ConnectionState, RetryPolicy, StreamChannel};
pub use decoder::decode;
