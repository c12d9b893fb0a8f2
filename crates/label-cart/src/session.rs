//! # Session Storage
//!
//! Durable client-local storage of the one cart handle per session.
//!
//! Storage is best effort: a failed read counts as "no handle", a failed
//! write is logged and the store keeps working from memory. Losing the
//! handle costs a fresh cart on the next start, nothing more.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::config::project_dirs;

/// Key/value storage for the cart handle.
pub trait SessionStorage: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Option<String>>;

    fn save(&self, key: &str, value: &str) -> io::Result<()>;

    fn clear(&self, key: &str) -> io::Result<()>;
}

// =============================================================================
// File Storage
// =============================================================================

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSessionStorage { dir: dir.into() }
    }

    /// Storage in the platform data directory of the configurator.
    pub fn in_data_dir() -> Option<Self> {
        project_dirs().map(|dirs| Self::new(dirs.data_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(file)
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => {
                let value = contents.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        std::fs::write(&path, value)?;
        debug!(?path, "Cart handle persisted");
        Ok(())
    }

    fn clear(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// Non-durable storage (tests, private browsing).
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage, as if a previous visit left a handle behind.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut values) = storage.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        storage
    }

    fn values(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "session storage poisoned"))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> io::Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

impl<S: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<S> {
    fn load(&self, key: &str) -> io::Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        (**self).save(key, value)
    }

    fn clear(&self, key: &str) -> io::Result<()> {
        (**self).clear(key)
    }
}

// =============================================================================
// Best-Effort Helpers
// =============================================================================

pub(crate) fn load_or_none<S: SessionStorage + ?Sized>(storage: &S, key: &str) -> Option<String> {
    storage.load(key).unwrap_or_else(|e| {
        warn!(?e, key, "Failed to read cart handle, starting without one");
        None
    })
}

pub(crate) fn save_or_warn<S: SessionStorage + ?Sized>(storage: &S, key: &str, value: &str) {
    if let Err(e) = storage.save(key, value) {
        warn!(?e, key, "Failed to persist cart handle, keeping it in memory only");
    }
}

pub(crate) fn clear_or_warn<S: SessionStorage + ?Sized>(storage: &S, key: &str) {
    if let Err(e) = storage.clear(key) {
        warn!(?e, key, "Failed to clear persisted cart handle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        // not created until the first save
        let storage = FileSessionStorage::new(dir.path().join("session"));

        assert_eq!(storage.load("shopify_cart_id").unwrap(), None);
        storage.save("shopify_cart_id", "gid://shopify/Cart/abc").unwrap();
        assert_eq!(
            storage.load("shopify_cart_id").unwrap().as_deref(),
            Some("gid://shopify/Cart/abc")
        );

        storage.clear("shopify_cart_id").unwrap();
        assert_eq!(storage.load("shopify_cart_id").unwrap(), None);
        // clearing twice is fine
        storage.clear("shopify_cart_id").unwrap();
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileSessionStorage::new(dir.path())
            .save("shopify_cart_id", "gid://shopify/Cart/abc")
            .unwrap();

        let reopened = FileSessionStorage::new(dir.path());
        assert_eq!(
            load_or_none(&reopened, "shopify_cart_id").as_deref(),
            Some("gid://shopify/Cart/abc")
        );
    }

    #[test]
    fn test_file_names_are_sanitized() {
        let storage = FileSessionStorage::new("/tmp/x");
        assert_eq!(storage.path("../evil key"), PathBuf::from("/tmp/x/___evil_key"));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemorySessionStorage::with_value("k", "v");
        assert_eq!(storage.load("k").unwrap().as_deref(), Some("v"));
        storage.clear("k").unwrap();
        assert_eq!(storage.load("k").unwrap(), None);
    }
}
