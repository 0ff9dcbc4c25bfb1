//! Session credential management.
//!
//! Holds the opaque bearer token for the logged-in operator. The token is
//! attached to every REST call and to the stream handshake, set on login,
//! and cleared on logout or on any `Unauthorized` response. Its absence is
//! never an error here; unauthenticated calls simply come back as
//! [`watchpost_shared::ApiError::Unauthorized`].

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::storage;

const STORAGE_KEY: &str = "watchpost_session";

/// Stored session data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub username: String,
    pub token: String,
}

/// Process-wide session handle. Cheap to clone; all clones share state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<SessionData>>>,
    persist: bool,
}

impl Session {
    /// Ephemeral session, not backed by disk. Used in tests and by callers
    /// that manage credentials themselves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session restored from persistent storage, kept in sync with it.
    pub fn load() -> Self {
        Self {
            inner: Arc::new(RwLock::new(storage::load(STORAGE_KEY))),
            persist: true,
        }
    }

    /// Store the credential obtained from a successful login.
    pub fn login(&self, username: impl Into<String>, token: impl Into<String>) {
        let data = SessionData {
            username: username.into(),
            token: token.into(),
        };
        if self.persist {
            if let Err(err) = storage::save(STORAGE_KEY, &data) {
                tracing::warn!("failed to persist session: {err}");
            }
        }
        *self.inner.write() = Some(data);
    }

    /// Drop the credential (logout, or an Unauthorized response).
    pub fn clear(&self) {
        if self.persist {
            if let Err(err) = storage::remove(STORAGE_KEY) {
                tracing::warn!("failed to remove persisted session: {err}");
            }
        }
        *self.inner.write() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|d| d.token.clone())
    }

    pub fn username(&self) -> Option<String> {
        self.inner.read().as_ref().map(|d| d.username.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let other = session.clone();
        session.login("operator", "tok-1");
        assert_eq!(other.token().as_deref(), Some("tok-1"));
        other.clear();
        assert!(!session.is_authenticated());
    }
}
