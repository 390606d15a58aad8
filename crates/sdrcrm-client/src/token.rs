//! Storage for the bearer token

use parking_lot::RwLock;
use sdrcrm_core::Result;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Holds the bearer token between requests.
///
/// The client reads it before every call and clears it on a 401.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Current token, if signed in
    fn get(&self) -> Option<String>;

    /// Replace the token
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    fn set(&self, token: &str) -> Result<()>;

    /// Forget the token
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be removed.
    fn clear(&self) -> Result<()>;
}

/// Token kept in process memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `token`
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.write() = None;
        Ok(())
    }
}

/// Token persisted to a single file (`sdr-token` by default).
///
/// The file is read once when the store is opened; writes go through to disk.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<String>>,
}

impl FileTokenStore {
    /// Open the store backed by `path`, loading any token already saved there
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cached = match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), signed_in = cached.is_some(), "opened token file");

        Ok(Self {
            path,
            cached: RwLock::new(cached),
        })
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cached.read().clone()
    }

    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        *self.cached.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.cached.write() = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdrcrm_core::config::TOKEN_FILE_NAME;

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert!(store.get().is_none());

        store.set("abc").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc"));

        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(TOKEN_FILE_NAME);

        let store = FileTokenStore::open(&path).unwrap();
        assert!(store.get().is_none());
        store.set("tok-1").unwrap();

        let reopened = FileTokenStore::open(&path).unwrap();
        assert_eq!(reopened.get().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE_NAME);

        let store = FileTokenStore::open(&path).unwrap();
        store.set("tok").unwrap();
        store.clear().unwrap();

        assert!(store.get().is_none());
        assert!(!path.exists());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_ignores_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TOKEN_FILE_NAME);
        std::fs::write(&path, "  \n").unwrap();

        assert!(FileTokenStore::open(&path).unwrap().get().is_none());
    }
}
