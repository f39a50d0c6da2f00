//! Durable bearer-credential storage.
//!
//! A single named slot that survives client restarts, the moral equivalent of
//! a browser's local storage key. The store is purely mechanical: it never
//! validates the credential it holds.
//!
//! Storage failures degrade to in-memory-only operation (the session is lost
//! on restart) and are logged rather than surfaced - persistence problems
//! must never take the session layer down with them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use bazaar_core::AccessToken;

/// On-disk shape of the credential slot.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    access_token: String,
    /// Unix timestamp of the last write, for operator forensics only.
    saved_at: i64,
}

/// Durable single-slot storage for the bearer credential.
///
/// The in-memory copy is authoritative for the running process; the file is
/// a best-effort mirror read once at construction.
pub struct CredentialStore {
    path: PathBuf,
    cached: RwLock<Option<AccessToken>>,
}

impl CredentialStore {
    /// Open the store at `path`, loading any previously persisted credential.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let cached = read_slot(&path);
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    /// The currently stored credential, if any.
    #[must_use]
    pub fn get(&self) -> Option<AccessToken> {
        self.cached.read().ok().and_then(|guard| guard.clone())
    }

    /// Store a credential, replacing any previous one.
    pub fn set(&self, token: &AccessToken) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = Some(token.clone());
        }

        let record = StoredCredential {
            access_token: token.expose().to_string(),
            saved_at: chrono::Utc::now().timestamp(),
        };

        if let Err(e) = write_slot(&self.path, &record) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist credential, continuing in-memory only"
            );
        }
    }

    /// Remove the stored credential.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.cached.write() {
            *guard = None;
        }

        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove persisted credential"
            );
        }
    }
}

/// Read the slot from disk. Any failure (missing file, unreadable, garbled)
/// yields an empty slot.
fn read_slot(path: &Path) -> Option<AccessToken> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to read credential slot");
            }
            return None;
        }
    };

    match serde_json::from_str::<StoredCredential>(&contents) {
        Ok(record) => Some(AccessToken::new(record.access_token)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring garbled credential slot");
            None
        }
    }
}

fn write_slot(path: &Path, record: &StoredCredential) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(record).map_err(std::io::Error::other)?;
    fs::write(path, json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential");

        let store = CredentialStore::new(path.clone());
        assert!(store.get().is_none());

        store.set(&AccessToken::new("tok-1"));
        assert_eq!(store.get().unwrap().expose(), "tok-1");

        // A fresh instance on the same path sees the persisted credential.
        let reopened = CredentialStore::new(path);
        assert_eq!(reopened.get().unwrap().expose(), "tok-1");
    }

    #[test]
    fn test_clear_removes_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential");

        let store = CredentialStore::new(path.clone());
        store.set(&AccessToken::new("tok-1"));
        store.clear();

        assert!(store.get().is_none());
        assert!(!path.exists());

        // Clearing an already empty slot is a no-op.
        store.clear();
    }

    #[test]
    fn test_unwritable_path_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        // Parent "file" is a regular file, so create_dir_all will fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("credential");

        let store = CredentialStore::new(path);
        store.set(&AccessToken::new("tok-1"));

        // The write failed but the in-memory copy still serves the process.
        assert_eq!(store.get().unwrap().expose(), "tok-1");
    }

    #[test]
    fn test_garbled_slot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential");
        fs::write(&path, b"not json at all").unwrap();

        let store = CredentialStore::new(path);
        assert!(store.get().is_none());
    }
}
