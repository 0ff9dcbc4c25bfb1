//! Shared types for the watchpost surveillance dashboard client.

pub mod error;
pub mod models;
pub mod protocol;
pub mod time;

pub use error::*;
pub use models::*;
pub use protocol::*;
