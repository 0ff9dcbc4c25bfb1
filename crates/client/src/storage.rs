//! JSON-file persistence in the platform config directory.
//!
//! Linux: `~/.config/watchpost/`, macOS:
//! `~/Library/Application Support/watchpost/`, Windows: `%APPDATA%\watchpost\`.

use std::io;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};

const APP_DIR: &str = "watchpost";

/// Write a value under `key`, creating the config directory if needed.
pub fn save<T: Serialize>(key: &str, value: &T) -> io::Result<()> {
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    std::fs::write(file_path(key)?, json)
}

/// Read a value stored under `key`. A missing file or an unreadable payload
/// both come back as `None`.
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = std::fs::read_to_string(file_path(key).ok()?).ok()?;
    serde_json::from_str(&json).ok()
}

/// Delete the value stored under `key`. Deleting an absent key is not an
/// error.
pub fn remove(key: &str) -> io::Result<()> {
    match std::fs::remove_file(file_path(key)?) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn file_path(key: &str) -> io::Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| io::Error::other("no config directory on this platform"))?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("{}.json", sanitize(key))))
}

// Keys become file names; anything outside [A-Za-z0-9_-] is replaced.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
