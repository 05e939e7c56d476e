//! Persisted session token and the side effects of session failures.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Side effects the client triggers on failed requests; the rejected result is
/// still returned to the caller afterwards.
pub trait SessionHooks: Send + Sync {
    /// A 401 was received: log out and send the user to the login entry point
    fn on_unauthorized(&self);

    /// A 5xx or a request that never got a response
    fn on_transport_failure(&self, message: &str);
}

/// Hooks that only trace; used when no state container is attached
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHooks;

impl SessionHooks for LoggingHooks {
    fn on_unauthorized(&self) {
        warn!("session expired");
    }

    fn on_transport_failure(&self, message: &str) {
        warn!(%message, "request failed");
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    token: Option<String>,
}

/// Bearer token shared by the client and whoever logs the user out
#[derive(Clone, Debug, Default)]
pub struct TokenStore {
    /// Backing file; `None` keeps the token in memory only
    path: Option<PathBuf>,
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// `~/.chama/session.json`
    pub fn default_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        Some(home.join(".chama").join("session.json"))
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the persisted token; a missing or unreadable file means no session
    pub fn load(path: PathBuf) -> Self {
        let token = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<SessionFile>(&content).ok())
            .and_then(|file| file.token)
            .filter(|t| !t.is_empty());
        debug!(path = %path.display(), has_token = token.is_some(), "loaded session");

        Self {
            path: Some(path),
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.read().is_some()
    }

    /// Store a token and persist it
    pub fn save(&self, token: &str) -> Result<()> {
        *self.token.write() = Some(token.to_string());
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SessionFile {
            token: Some(token.to_string()),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Forget the token and remove the persisted session
    pub fn clear(&self) -> Result<()> {
        *self.token.write() = None;
        match &self.path {
            Some(path) if path.exists() => Ok(fs::remove_file(path)?),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = TokenStore::load(path.clone());
        assert!(!store.is_logged_in());

        store.save("abc123").unwrap();
        let reloaded = TokenStore::load(path.clone());
        assert_eq!(reloaded.token().as_deref(), Some("abc123"));

        reloaded.clear().unwrap();
        assert!(!path.exists());
        assert!(reloaded.token().is_none());
    }

    #[test]
    fn test_corrupt_file_means_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(TokenStore::load(path).token().is_none());
    }

    #[test]
    fn test_clones_share_token() {
        let store = TokenStore::in_memory();
        let shared = store.clone();
        store.save("t").unwrap();
        assert_eq!(shared.token().as_deref(), Some("t"));
        shared.clear().unwrap();
        assert!(!store.is_logged_in());
    }
}
