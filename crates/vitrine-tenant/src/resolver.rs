//! Tenant resolution: which tenant's data the running client shows.
//!
//! The resolver owns every piece of per-session tenant state: the slug the
//! host was opened with (captured once at construction), the active tenant,
//! the tenant the host is locked to, and the "no storefront" warning latch.
//! Tests build isolated instances through [`TenantResolver::builder`].

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vitrine_core::clock::{SharedClock, SystemClock};
use vitrine_core::location::Location;
use vitrine_core::models::session::SessionUser;
use vitrine_core::models::tenant::{CustomDomainTenant, ResolvedTenant, Tenant, TenantScope};
use vitrine_core::repository::collections;
use vitrine_core::storage::{KeyValueStore, SharedStore, keys};

use crate::config::TenantConfig;
use crate::domain::{
    HostClass, HostKind, SubdomainSlug, classify_host, normalize_domain_value,
    sanitize_subdomain_slug, slug_for_class,
};
use crate::error::TenantError;
use crate::notify::{Notice, Notifier, TracingNotifier};

/// Outcome of matching the host against the authoritative tenant list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Tenant to show. `None` leaves the client unresolved.
    pub active_tenant: Option<TenantScope>,
    /// Tenant the host is bound to, if any.
    pub host_locked_tenant: Option<TenantScope>,
}

/// Custom-domain cache record as stored locally.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomDomainEntry {
    tenant_id: String,
    subdomain: String,
    ts: i64,
}

#[derive(Debug, Default)]
struct ResolverState {
    active: Option<TenantScope>,
    host_tenant: Option<TenantScope>,
    warned_missing_storefront: bool,
}

pub struct TenantResolverBuilder {
    config: TenantConfig,
    location: Location,
    store: SharedStore,
    clock: SharedClock,
    notifier: Arc<dyn Notifier>,
    bootstrap: Option<CustomDomainTenant>,
}

impl TenantResolverBuilder {
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Custom-domain mapping injected by the page that served the client.
    pub fn bootstrap(mut self, bootstrap: CustomDomainTenant) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn build(self) -> TenantResolver {
        let host_class = classify_host(self.location.hostname(), &self.config);
        let host_kind = HostKind::detect(self.location.hostname(), &self.config);
        let mut resolver = TenantResolver {
            config: self.config,
            location: self.location,
            store: self.store,
            clock: self.clock,
            notifier: self.notifier,
            bootstrap: self.bootstrap,
            host_class,
            host_kind,
            host_slug: None,
            state: Mutex::new(ResolverState::default()),
        };
        resolver.host_slug = resolver.derive_host_slug();
        let initial = resolver.resolve_initial_tenant();
        debug!(
            host = resolver.location.hostname(),
            slug = ?resolver.host_slug.as_ref().map(SubdomainSlug::as_str),
            tenant_id = ?initial.as_ref().map(TenantScope::as_str),
            "Initial tenant resolved"
        );
        resolver.lock_state().active = initial;
        resolver
    }
}

pub struct TenantResolver {
    config: TenantConfig,
    location: Location,
    store: SharedStore,
    clock: SharedClock,
    notifier: Arc<dyn Notifier>,
    bootstrap: Option<CustomDomainTenant>,
    host_class: HostClass,
    host_kind: HostKind,
    host_slug: Option<SubdomainSlug>,
    state: Mutex<ResolverState>,
}

impl TenantResolver {
    pub fn builder(config: TenantConfig, location: Location, store: SharedStore) -> TenantResolverBuilder {
        TenantResolverBuilder {
            config,
            location,
            store,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TracingNotifier),
            bootstrap: None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &TenantConfig {
        &self.config
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    // -----------------------------------------------------------------------
    // Host
    // -----------------------------------------------------------------------

    /// Slug the host was opened with, captured once per resolver.
    pub fn host_slug(&self) -> Option<&SubdomainSlug> {
        self.host_slug.as_ref()
    }

    pub fn host_kind(&self) -> HostKind {
        self.host_kind
    }

    pub fn is_custom_domain(&self) -> bool {
        self.host_class == HostClass::CustomDomain
    }

    /// A host slug that is present and not the configured default.
    pub fn locked_slug(&self) -> Option<&SubdomainSlug> {
        self.host_slug
            .as_ref()
            .filter(|slug| !slug.is_default(&self.config))
    }

    pub fn is_subdomain_locked(&self) -> bool {
        self.locked_slug().is_some()
    }

    /// Hosts whose tenant is fixed by the hostname itself.
    fn is_host_bound(&self) -> bool {
        self.is_subdomain_locked() || self.is_custom_domain()
    }

    fn derive_host_slug(&self) -> Option<SubdomainSlug> {
        if let Some(forced) = self.location.query_param("tenant") {
            if let Some(slug) = SubdomainSlug::parse(&forced, &self.config) {
                return Some(slug);
            }
        }
        match self.host_class {
            HostClass::CustomDomain => self
                .custom_domain_tenant()
                .and_then(|entry| SubdomainSlug::parse(&entry.subdomain, &self.config)),
            ref class => slug_for_class(class, &self.config),
        }
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Best-effort synchronous resolution from local state only.
    ///
    /// Returns `None` when the host names a tenant whose id is not known yet;
    /// callers must wait for [`reconcile`](Self::reconcile) instead of guessing.
    pub fn resolve_initial_tenant(&self) -> Option<TenantScope> {
        if self.is_custom_domain() {
            if let Some(entry) = self.custom_domain_tenant() {
                if let Some(slug) = self.locked_slug() {
                    self.record_subdomain_mapping(slug.as_str(), &entry.tenant_id);
                }
                return Some(entry.tenant_id);
            }
            if self.host_slug.is_none() {
                return None;
            }
        }

        if let Some(slug) = self.locked_slug() {
            return self.cached_tenant_for_subdomain(slug.as_str());
        }

        if let Some(scope) = SessionUser::load(self.store.as_ref()).and_then(|u| u.tenant_scope()) {
            return Some(scope);
        }

        if let Some(scope) = self
            .store
            .get_item(keys::ACTIVE_TENANT)
            .and_then(|raw| TenantScope::parse(&raw))
        {
            return Some(scope);
        }

        TenantScope::parse(&self.config.default_tenant_id)
    }

    pub fn active_tenant(&self) -> Option<TenantScope> {
        self.lock_state().active.clone()
    }

    pub fn host_locked_tenant(&self) -> Option<TenantScope> {
        self.lock_state().host_tenant.clone()
    }

    fn set_active(&self, scope: Option<TenantScope>) {
        let changed = {
            let mut state = self.lock_state();
            let changed = state.active != scope;
            state.active = scope.clone();
            changed
        };
        if !changed || self.is_host_bound() {
            return;
        }
        match scope {
            Some(id) => self.store.persist(keys::ACTIVE_TENANT, id.as_str()),
            None => self.store.remove_item(keys::ACTIVE_TENANT),
        }
    }

    /// Match the host against the authoritative tenant list.
    pub fn reconcile(&self, tenants: &[Tenant]) -> Reconciliation {
        let matched = self.match_host(tenants);
        let locked = self.is_host_bound();

        if let Some(tenant) = matched {
            if let Some(slug) = &self.host_slug {
                self.record_subdomain_mapping(slug.as_str(), &tenant.id);
            }
            if self.is_custom_domain() {
                self.remember_custom_domain(tenant);
            }
            if locked {
                self.lock_state().host_tenant = Some(tenant.id.clone());
            }
            self.set_active(Some(tenant.id.clone()));
            info!(tenant_id = %tenant.id, "Host matched tenant");
            return self.snapshot();
        }

        if let Some(slug) = self.locked_slug() {
            let first_warning = {
                let mut state = self.lock_state();
                state.host_tenant = None;
                !std::mem::replace(&mut state.warned_missing_storefront, true)
            };
            if first_warning {
                warn!(slug = %slug, "No tenant matches host");
                self.notifier
                    .notify(Notice::error(format!("No storefront configured for {slug}.")));
            }
            self.set_active(None);
            return self.snapshot();
        }

        if self.is_custom_domain() {
            // Domain not claimed by any tenant yet; leave it unresolved.
            self.set_active(None);
            return self.snapshot();
        }

        let active = self.active_tenant();
        let active_exists = active
            .as_ref()
            .is_some_and(|id| tenants.iter().any(|t| t.id == *id));
        if !active_exists {
            if let Some(first) = tenants.first() {
                debug!(tenant_id = %first.id, "Active tenant missing, falling back to first");
                self.set_active(Some(first.id.clone()));
            }
        }
        self.snapshot()
    }

    fn match_host<'a>(&self, tenants: &'a [Tenant]) -> Option<&'a Tenant> {
        if let Some(slug) = &self.host_slug {
            let found = tenants
                .iter()
                .find(|t| sanitize_subdomain_slug(&t.subdomain) == slug.as_str());
            if found.is_some() {
                return found;
            }
        }
        if self.is_custom_domain() {
            let host = self.location.hostname();
            return tenants.iter().find(|t| {
                t.custom_domain
                    .as_deref()
                    .is_some_and(|d| normalize_domain_value(d) == host)
            });
        }
        None
    }

    fn snapshot(&self) -> Reconciliation {
        let state = self.lock_state();
        Reconciliation {
            active_tenant: state.active.clone(),
            host_locked_tenant: state.host_tenant.clone(),
        }
    }

    /// Tenant a switch on this host must target, if the host is bound.
    fn lock_target(&self) -> Option<String> {
        if let Some(host_tenant) = self.host_locked_tenant() {
            return Some(host_tenant.to_string());
        }
        let slug = self.locked_slug()?;
        Some(
            self.cached_tenant_for_subdomain(slug.as_str())
                .map(|id| id.to_string())
                .unwrap_or_else(|| slug.to_string()),
        )
    }

    /// Make `tenant_id` the active tenant.
    ///
    /// Returns `Ok(false)` when it already is. Fails with
    /// [`TenantError::HostLocked`] when the host is bound to another tenant.
    pub fn switch_tenant(&self, tenant_id: &str) -> Result<bool, TenantError> {
        let target = TenantScope::parse(tenant_id).ok_or(TenantError::EmptyTenantId)?;
        if self.active_tenant().as_ref() == Some(&target) {
            return Ok(false);
        }
        if let Some(locked) = self.lock_target() {
            if locked != target.as_str() {
                warn!(tenant_id = %target, locked_to = %locked, "Rejected tenant switch on locked host");
                self.notifier.notify(Notice::error(
                    "This subdomain is locked to its storefront. Use the primary admin domain to switch tenants.",
                ));
                return Err(TenantError::HostLocked { tenant_id: locked });
            }
        }
        info!(tenant_id = %target, "Switching tenant");
        self.set_active(Some(target));
        Ok(true)
    }

    /// Force the active tenant without lock checks. Used when the previously
    /// active tenant no longer exists.
    pub(crate) fn replace_active(&self, scope: Option<TenantScope>) {
        self.set_active(scope);
    }

    /// Apply a single-slug resolution from the fast path.
    ///
    /// Records the slug mapping and, if the cached scope turns out to belong
    /// to a different tenant, drops that scope's tenant-bound documents.
    pub fn apply_host_resolution(&self, resolved: &ResolvedTenant) -> bool {
        let Some(slug) = self.host_slug.clone() else {
            return false;
        };
        self.record_subdomain_mapping(slug.as_str(), &resolved.id);
        let previous = self.active_tenant();
        if let Some(stale) = previous.as_ref().filter(|prev| **prev != resolved.id) {
            debug!(stale = %stale, tenant_id = %resolved.id, "Purging cache of previous tenant scope");
            for key in collections::TENANT_BOUND {
                self.store.remove_item(&keys::scoped_cache(stale, key));
            }
        }
        if self.is_host_bound() {
            self.lock_state().host_tenant = Some(resolved.id.clone());
        }
        self.set_active(Some(resolved.id.clone()));
        previous.as_ref() != Some(&resolved.id)
    }

    // -----------------------------------------------------------------------
    // Local mapping caches
    // -----------------------------------------------------------------------

    pub fn cached_tenant_for_subdomain(&self, slug: &str) -> Option<TenantScope> {
        if slug.is_empty() {
            return None;
        }
        self.store
            .get_item(&keys::subdomain_tenant(slug))
            .and_then(|raw| TenantScope::parse(&raw))
    }

    pub fn record_subdomain_mapping(&self, slug: &str, tenant_id: &TenantScope) {
        if slug.is_empty() {
            return;
        }
        self.store.persist(&keys::subdomain_tenant(slug), tenant_id.as_str());
    }

    /// Fresh custom-domain mapping for this host, falling back to the
    /// bootstrap value.
    pub fn custom_domain_tenant(&self) -> Option<CustomDomainTenant> {
        let key = keys::custom_domain(self.location.hostname());
        let cached = self.store.get_item(&key).and_then(|raw| {
            serde_json::from_str::<CustomDomainEntry>(&raw)
                .map_err(|e| debug!(error = %e, key = %key, "Ignoring malformed custom-domain entry"))
                .ok()
        });
        if let Some(entry) = cached {
            let ttl_ms = i64::try_from(self.config.custom_domain_ttl.as_millis()).unwrap_or(i64::MAX);
            let age = self.clock.now_millis() - entry.ts;
            if entry.ts > 0 && age < ttl_ms {
                if let Some(tenant_id) = TenantScope::parse(&entry.tenant_id) {
                    return Some(CustomDomainTenant {
                        tenant_id,
                        subdomain: entry.subdomain,
                    });
                }
            }
        }
        self.bootstrap.clone()
    }

    /// Cache `tenant` as the owner of this custom domain.
    pub fn remember_custom_domain(&self, tenant: &Tenant) {
        let entry = CustomDomainEntry {
            tenant_id: tenant.id.to_string(),
            subdomain: tenant.subdomain.clone(),
            ts: self.clock.now_millis(),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self
                .store
                .persist(&keys::custom_domain(self.location.hostname()), &raw),
            Err(e) => debug!(error = %e, "Failed to encode custom-domain entry"),
        }
    }
}
