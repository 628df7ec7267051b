//! Dismissal trackers for the subscription prompts.
//!
//! The two trackers are keyed per tenant and live in different stores: the
//! daily notification dismissal in persistent storage, the popup dismissal in
//! session storage.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;
use vitrine_core::models::tenant::TenantScope;
use vitrine_core::storage::{KeyValueStore, SharedStore, keys};

use crate::status::same_local_day;

/// Persisted "dismissed today" marker for the pre-expiry notification.
/// Expires at local midnight.
#[derive(Clone)]
pub struct DailyDismissal {
    store: SharedStore,
}

impl DailyDismissal {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn last_dismissed(&self, tenant: &TenantScope) -> Option<DateTime<Utc>> {
        let raw = self.store.get_item(&keys::notification_dismissed(tenant))?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                debug!(tenant_id = %tenant, error = %e, "Ignoring malformed dismissal timestamp");
                None
            }
        }
    }

    pub fn is_dismissed_today<Tz: TimeZone>(&self, tenant: &TenantScope, now: &DateTime<Tz>) -> bool {
        self.last_dismissed(tenant)
            .is_some_and(|at| same_local_day(&at, now))
    }

    pub fn dismiss<Tz: TimeZone>(&self, tenant: &TenantScope, now: &DateTime<Tz>) {
        let at = now.with_timezone(&Utc);
        self.store
            .persist(&keys::notification_dismissed(tenant), &at.to_rfc3339());
    }
}

/// Session-scoped renewal popup dismissal.
#[derive(Clone)]
pub struct PopupDismissal {
    session_store: SharedStore,
}

impl PopupDismissal {
    pub fn new(session_store: SharedStore) -> Self {
        Self { session_store }
    }

    pub fn is_dismissed(&self, tenant: &TenantScope) -> bool {
        self.session_store
            .get_item(&keys::popup_dismissed(tenant))
            .is_some_and(|v| v == "true")
    }

    pub fn dismiss(&self, tenant: &TenantScope) {
        self.session_store
            .persist(&keys::popup_dismissed(tenant), "true");
    }

    pub fn clear(&self, tenant: &TenantScope) {
        self.session_store.remove_item(&keys::popup_dismissed(tenant));
    }
}
