//! Tenant-scoped local cache.
//!
//! Entries live under `ds_cache_<scope>::<key>` as `{data, timestamp}` and are
//! trusted only while younger than the configured TTL. The scope always comes
//! from the same [`TenantResolver`] that decides the active tenant, so the two
//! cannot drift apart.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vitrine_core::models::tenant::TenantScope;
use vitrine_core::repository::collections;
use vitrine_core::storage::{KeyValueStore, keys};

use crate::resolver::TenantResolver;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Unix milliseconds at write time.
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct ScopedCache {
    resolver: Arc<TenantResolver>,
}

impl ScopedCache {
    pub fn new(resolver: Arc<TenantResolver>) -> Self {
        Self { resolver }
    }

    /// Scope reads and writes go to, or `None` when it cannot be trusted.
    ///
    /// On a subdomain-locked host the subdomain mapping must name the same
    /// tenant as the resolver; any disagreement disables the cache.
    pub fn scope(&self) -> Option<TenantScope> {
        let scope = self.resolver.active_tenant()?;
        if let Some(slug) = self.resolver.locked_slug() {
            let mapped = self.resolver.cached_tenant_for_subdomain(slug.as_str());
            if mapped.as_ref() != Some(&scope) {
                debug!(slug = %slug, scope = %scope, "Subdomain mapping disagrees with cache scope");
                return None;
            }
        }
        Some(scope)
    }

    /// Fresh value for `key`, or `fallback`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        self.try_get(key).unwrap_or(fallback)
    }

    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let scope = self.scope()?;
        self.read_fresh(&keys::scoped_cache(&scope, key))
    }

    /// Best-effort write under the current scope. Failures are dropped.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.try_set(key, value);
    }

    /// Write under the current scope, reporting whether it landed.
    pub fn try_set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match self.scope() {
            Some(scope) => self.write(&keys::scoped_cache(&scope, key), value),
            None => false,
        }
    }

    pub fn get_global<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read_fresh(&keys::global_cache(key))
    }

    pub fn set_global<T: Serialize>(&self, key: &str, value: &T) -> bool {
        self.write(&keys::global_cache(key), value)
    }

    /// Whether a fresh, non-empty product list is cached for the current
    /// scope.
    pub fn has_cached_data(&self) -> bool {
        self.try_get::<Vec<serde_json::Value>>(collections::PRODUCTS)
            .is_some_and(|products| !products.is_empty())
    }

    fn read_fresh<T: DeserializeOwned>(&self, storage_key: &str) -> Option<T> {
        let raw = self.resolver.store().get_item(storage_key)?;
        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = storage_key, error = %e, "Ignoring malformed cache entry");
                return None;
            }
        };
        let ttl_ms = i64::try_from(self.resolver.config().cache_ttl.as_millis()).unwrap_or(i64::MAX);
        let age = self.resolver.clock().now_millis() - entry.timestamp;
        (age < ttl_ms).then_some(entry.data)
    }

    fn write<T: Serialize>(&self, storage_key: &str, value: &T) -> bool {
        let entry = CacheEntry {
            data: value,
            timestamp: self.resolver.clock().now_millis(),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self.resolver.store().try_persist(storage_key, &raw),
            Err(e) => {
                debug!(key = storage_key, error = %e, "Failed to encode cache entry");
                false
            }
        }
    }
}
