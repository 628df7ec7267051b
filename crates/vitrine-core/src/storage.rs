//! Local key/value storage capability.
//!
//! Mirrors the semantics of browser local/session storage: string keys,
//! string values, synchronous access. Writes are best-effort by policy;
//! [`KeyValueStore::try_persist`] exposes the outcome to callers that care,
//! [`KeyValueStore::persist`] drops it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::VitrineError;

/// Well-known storage keys shared across crates.
pub mod keys {
    use crate::models::tenant::TenantScope;

    /// Persisted session user record (JSON).
    pub const SESSION_USER: &str = "admin_auth_user";
    /// Last active tenant id on hosts that are not subdomain-locked.
    pub const ACTIVE_TENANT: &str = "vitrine-active-tenant";
    /// Admin panel sub-section (session-scoped).
    pub const ADMIN_SECTION: &str = "adminSection";
    /// Order to highlight when the admin panel opens (session-scoped).
    pub const HIGHLIGHT_ORDER_ID: &str = "highlightOrderId";

    const SUBDOMAIN_TENANT_PREFIX: &str = "ds_subdomain_tenant_";
    const CUSTOM_DOMAIN_PREFIX: &str = "custom_domain_";
    const SCOPED_CACHE_PREFIX: &str = "ds_cache_";
    const NOTIFICATION_DISMISSED_PREFIX: &str = "subscription_notification_dismissed_";
    const POPUP_DISMISSED_PREFIX: &str = "subscription_popup_dismissed_";

    pub fn subdomain_tenant(slug: &str) -> String {
        format!("{SUBDOMAIN_TENANT_PREFIX}{slug}")
    }

    pub fn custom_domain(hostname: &str) -> String {
        format!("{CUSTOM_DOMAIN_PREFIX}{hostname}")
    }

    pub fn scoped_cache(scope: &TenantScope, key: &str) -> String {
        format!("{SCOPED_CACHE_PREFIX}{scope}::{key}")
    }

    /// Cache entry shared by all tenants (e.g. the tenant list).
    pub fn global_cache(key: &str) -> String {
        format!("{SCOPED_CACHE_PREFIX}global::{key}")
    }

    pub fn notification_dismissed(tenant: &TenantScope) -> String {
        format!("{NOTIFICATION_DISMISSED_PREFIX}{tenant}")
    }

    pub fn popup_dismissed(tenant: &TenantScope) -> String {
        format!("{POPUP_DISMISSED_PREFIX}{tenant}")
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("storage is unavailable")]
    Unavailable,

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<StorageError> for VitrineError {
    fn from(err: StorageError) -> Self {
        VitrineError::Storage(err.to_string())
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    fn try_set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str);

    /// Write `value`, reporting whether it landed.
    fn try_persist(&self, key: &str, value: &str) -> bool {
        match self.try_set_item(key, value) {
            Ok(()) => true,
            Err(e) => {
                debug!(key, error = %e, "Local storage write failed");
                false
            }
        }
    }

    /// Best-effort write; failures are logged and dropped.
    fn persist(&self, key: &str, value: &str) {
        let _ = self.try_persist(key, value);
    }
}

pub type SharedStore = Arc<dyn KeyValueStore>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store. Used for session-scoped storage and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    /// Maximum total bytes of keys + values; `None` is unbounded.
    quota: Option<usize>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once `bytes` of keys and values are held.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Reject every write with [`StorageError::Unavailable`] until switched
    /// back, as a browser does with storage disabled.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn try_set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StorageError::Unavailable);
        }
        let mut entries = lock(&self.entries);
        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded { key: key.into() });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        lock(&self.entries).remove(key);
    }
}

/// JSON-file backed persistent store.
///
/// The whole map is rewritten on every mutation through a temp file and a
/// rename, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A corrupt file is logged and treated as empty; it is overwritten by
    /// the next successful write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding corrupt storage file");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn try_set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            // Keep memory and disk in agreement.
            match previous {
                Some(prev) => entries.insert(key.to_string(), prev),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            if let Err(e) = self.flush(&entries) {
                debug!(key, error = %e, "Failed to flush storage after removal");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_rejects_oversized_writes() {
        let store = MemoryStore::with_quota(16);
        assert!(store.try_persist("a", "12345"));
        assert!(!store.try_persist("b", "0123456789abcdef"));
        assert_eq!(store.get_item("b"), None);
        // Overwriting an existing key only counts the new value.
        assert!(store.try_persist("a", "1234567890"));
    }

    #[test]
    fn unavailable_store_rejects_writes_until_restored() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.try_set_item("k", "v"), Err(StorageError::Unavailable)));
        store.persist("k", "v");
        assert!(store.is_empty());

        store.set_unavailable(false);
        assert!(store.try_persist("k", "v"));
        assert_eq!(store.get_item("k").as_deref(), Some("v"));
    }

    #[test]
    fn persist_swallows_failures() {
        let store = MemoryStore::with_quota(0);
        store.persist("key", "value");
        assert!(store.is_empty());
    }
}
