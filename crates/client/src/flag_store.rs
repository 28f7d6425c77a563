//! Persisted "someone was signed in" marker.
//!
//! The marker survives restarts and only tells the lifecycle controller that
//! restoring a session is worth a request. It never carries credentials:
//! those stay in the HTTP client's cookie jar.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use adminpanel_core::UserId;

/// What gets persisted on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub user_id: UserId,
}

impl SessionMarker {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Error)]
pub enum FlagStoreError {
    #[error("flag store IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session marker: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable storage for the [`SessionMarker`].
pub trait SessionFlagStore: Send + Sync {
    /// Marker left by a previous login, if any. Unreadable state counts as absent.
    fn get_user(&self) -> Option<SessionMarker>;

    fn set_user(&self, marker: &SessionMarker) -> Result<(), FlagStoreError>;

    /// Remove the marker. Clearing an absent marker is not an error.
    fn clear_user(&self) -> Result<(), FlagStoreError>;
}

/// Process-local store, for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct InMemoryFlagStore {
    marker: Mutex<Option<SessionMarker>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(marker: SessionMarker) -> Self {
        Self {
            marker: Mutex::new(Some(marker)),
        }
    }
}

impl SessionFlagStore for InMemoryFlagStore {
    fn get_user(&self) -> Option<SessionMarker> {
        self.marker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_user(&self, marker: &SessionMarker) -> Result<(), FlagStoreError> {
        *self.marker.lock().unwrap_or_else(PoisonError::into_inner) = Some(marker.clone());
        Ok(())
    }

    fn clear_user(&self) -> Result<(), FlagStoreError> {
        *self.marker.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file on disk (e.g. `<data dir>/adminpanel/session.json`).
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> FlagStoreError {
        FlagStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionFlagStore for FileFlagStore {
    fn get_user(&self) -> Option<SessionMarker> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "failed to read session marker");
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(marker) => Some(marker),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "ignoring corrupt session marker");
                None
            }
        }
    }

    fn set_user(&self, marker: &SessionMarker) -> Result<(), FlagStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write-then-rename so a crash never leaves a half-written marker.
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec(marker)?;
        std::fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn clear_user(&self) -> Result<(), FlagStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("adminpanel-flags-{}-{}", name, std::process::id()))
            .join("session.json")
    }

    #[test]
    fn in_memory_roundtrip() {
        let store = InMemoryFlagStore::new();
        assert!(store.get_user().is_none());

        store.set_user(&SessionMarker::new(UserId::new("1"))).unwrap();
        assert_eq!(store.get_user().unwrap().user_id, UserId::new("1"));

        store.clear_user().unwrap();
        assert!(store.get_user().is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_path("persist");
        let store = FileFlagStore::new(&path);
        store.set_user(&SessionMarker::new(UserId::new("42"))).unwrap();

        let reopened = FileFlagStore::new(&path);
        assert_eq!(
            reopened.get_user(),
            Some(SessionMarker::new(UserId::new("42")))
        );

        reopened.clear_user().unwrap();
        assert!(store.get_user().is_none());
        // Clearing twice is fine.
        reopened.clear_user().unwrap();

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn corrupt_marker_reads_as_absent() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        assert!(FileFlagStore::new(&path).get_user().is_none());

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
