//! Tenant service: tenant list lifecycle on top of the resolver.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};
use vitrine_core::error::{VitrineError, VitrineResult};
use vitrine_core::models::tenant::{CreateTenant, Tenant, TenantScope};
use vitrine_core::repository::{TenantRepository, collections};

use crate::cache::ScopedCache;
use crate::error::TenantError;
use crate::notify::{Notice, Notifier};
use crate::resolver::{Reconciliation, TenantResolver};

#[derive(Debug, Default)]
struct ServiceState {
    tenants: Vec<Tenant>,
    switch_target: Option<TenantScope>,
    switching: bool,
    seeding: bool,
    deleting: Option<TenantScope>,
}

/// Tenant list loading, switching, creation and deletion.
///
/// Generic over the repository implementation so that this crate has no
/// dependency on the transport.
pub struct TenantService<R: TenantRepository> {
    repo: R,
    resolver: Arc<TenantResolver>,
    cache: ScopedCache,
    state: Mutex<ServiceState>,
}

impl<R: TenantRepository> TenantService<R> {
    pub fn new(repo: R, resolver: Arc<TenantResolver>) -> Self {
        let cache = ScopedCache::new(Arc::clone(&resolver));
        Self {
            repo,
            resolver,
            cache,
            state: Mutex::new(ServiceState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn resolver(&self) -> &Arc<TenantResolver> {
        &self.resolver
    }

    pub fn cache(&self) -> &ScopedCache {
        &self.cache
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn tenants(&self) -> Vec<Tenant> {
        self.lock_state().tenants.clone()
    }

    pub fn active_tenant(&self) -> Option<TenantScope> {
        self.resolver.active_tenant()
    }

    pub fn is_switching(&self) -> bool {
        self.lock_state().switching
    }

    pub fn is_seeding(&self) -> bool {
        self.lock_state().seeding
    }

    pub fn deleting_tenant(&self) -> Option<TenantScope> {
        self.lock_state().deleting.clone()
    }

    /// Subdomain of the active tenant, empty when unknown.
    pub fn active_tenant_subdomain(&self) -> String {
        let Some(active) = self.resolver.active_tenant() else {
            return String::new();
        };
        self.lock_state()
            .tenants
            .iter()
            .find(|t| t.id == active)
            .map(|t| t.subdomain.clone())
            .unwrap_or_default()
    }

    /// Store `tenants` and reconcile the host against them.
    pub fn apply_tenant_list(&self, tenants: Vec<Tenant>) -> Reconciliation {
        let outcome = self.resolver.reconcile(&tenants);
        self.lock_state().tenants = tenants;
        outcome
    }

    /// Load the tenant list. Unless `force` is set a fresh copy from the
    /// global cache is used instead of the remote.
    pub async fn refresh_tenants(&self, force: bool) -> VitrineResult<Vec<Tenant>> {
        if !force {
            if let Some(cached) = self.cache.get_global::<Vec<Tenant>>(collections::TENANTS) {
                debug!(count = cached.len(), "Using cached tenant list");
                self.apply_tenant_list(cached.clone());
                return Ok(cached);
            }
        }
        let tenants = self.repo.list_tenants().await?;
        self.cache.set_global(collections::TENANTS, &tenants);
        self.apply_tenant_list(tenants.clone());
        Ok(tenants)
    }

    /// Resolve the host's tenant, preferring the single-slug endpoint on
    /// subdomain-locked hosts and falling back to the full list.
    pub async fn resolve_host(&self) -> VitrineResult<Option<TenantScope>> {
        if let Some(slug) = self.resolver.locked_slug().cloned() {
            match self.repo.resolve_by_subdomain(slug.as_str()).await {
                Ok(Some(resolved)) => {
                    info!(slug = %slug, tenant_id = %resolved.id, "Resolved tenant by subdomain");
                    self.resolver.apply_host_resolution(&resolved);
                    return Ok(self.resolver.active_tenant());
                }
                Ok(None) => debug!(slug = %slug, "Subdomain not resolvable, loading tenant list"),
                Err(e) => warn!(slug = %slug, error = %e, "Subdomain resolution failed, loading tenant list"),
            }
            self.refresh_tenants(true).await?;
            return Ok(self.resolver.active_tenant());
        }
        self.refresh_tenants(false).await?;
        Ok(self.resolver.active_tenant())
    }

    /// Begin switching to `tenant_id`. The switch completes once the caller
    /// has loaded the tenant's data and calls [`complete_switch`](Self::complete_switch).
    pub fn switch_tenant(&self, tenant_id: &str) -> Result<bool, TenantError> {
        let changed = self.resolver.switch_tenant(tenant_id)?;
        if changed {
            let mut state = self.lock_state();
            state.switch_target = self.resolver.active_tenant();
            state.switching = true;
        }
        Ok(changed)
    }

    /// Finish a switch started by [`switch_tenant`](Self::switch_tenant).
    /// Does nothing if no switch to the current tenant is pending.
    pub fn complete_switch(&self, load_error: Option<&VitrineError>) {
        let active = self.resolver.active_tenant();
        let name = {
            let mut state = self.lock_state();
            if state.switch_target.is_none() || state.switch_target != active {
                return;
            }
            state.switch_target = None;
            state.switching = false;
            state
                .tenants
                .iter()
                .find(|t| Some(&t.id) == active.as_ref())
                .map(|t| t.name.clone())
        };
        let notifier = self.resolver.notifier();
        match load_error {
            Some(e) => {
                warn!(error = %e, "Tenant switch failed to load data");
                notifier.notify(Notice::error("Unable to switch tenants. Please try again."));
            }
            None => {
                let name = name.unwrap_or_else(|| "selected tenant".into());
                notifier.notify(Notice::success(format!("Now viewing {name}")));
            }
        }
    }

    /// Create a tenant, refresh the list and optionally switch to it.
    pub async fn create_tenant(&self, input: CreateTenant, activate: bool) -> VitrineResult<Tenant> {
        self.lock_state().seeding = true;
        let result = self.create_tenant_inner(input, activate).await;
        self.lock_state().seeding = false;
        let notifier = self.resolver.notifier();
        match &result {
            Ok(tenant) => notifier.notify(Notice::success(format!("{} is ready", tenant.name))),
            Err(e) => {
                warn!(error = %e, "Failed to create tenant");
                notifier.notify(Notice::error(e.to_string()));
            }
        }
        result
    }

    async fn create_tenant_inner(&self, input: CreateTenant, activate: bool) -> VitrineResult<Tenant> {
        let created = self.repo.create(input).await?;
        let resolved = match self.refresh_tenants(true).await {
            Ok(list) => list
                .into_iter()
                .find(|t| t.id == created.id || t.subdomain == created.subdomain)
                .unwrap_or(created),
            Err(e) => {
                warn!(error = %e, "Unable to refresh tenants after creation");
                let mut state = self.lock_state();
                state.tenants.retain(|t| t.id != created.id);
                state.tenants.insert(0, created.clone());
                created
            }
        };
        if activate {
            if let Err(e) = self.switch_tenant(resolved.id.as_str()) {
                warn!(tenant_id = %resolved.id, error = %e, "Created tenant could not be activated");
            }
        }
        Ok(resolved)
    }

    /// Delete a tenant. If it was active, move to the first remaining tenant
    /// or the default tenant id.
    pub async fn delete_tenant(&self, tenant_id: &TenantScope) -> VitrineResult<()> {
        let was_active = self.resolver.active_tenant().as_ref() == Some(tenant_id);
        self.lock_state().deleting = Some(tenant_id.clone());
        let result = self.delete_tenant_inner(tenant_id, was_active).await;
        self.lock_state().deleting = None;
        let notifier = self.resolver.notifier();
        match &result {
            Ok(()) => notifier.notify(Notice::success("Tenant removed")),
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "Failed to delete tenant");
                notifier.notify(Notice::error(e.to_string()));
            }
        }
        result
    }

    async fn delete_tenant_inner(&self, tenant_id: &TenantScope, was_active: bool) -> VitrineResult<()> {
        self.repo.delete(tenant_id).await?;
        let fallback = match self.refresh_tenants(true).await {
            Ok(list) => list.first().map(|t| t.id.clone()),
            Err(e) => {
                warn!(error = %e, "Unable to refresh tenants after deletion");
                let mut state = self.lock_state();
                state.tenants.retain(|t| t.id != *tenant_id);
                state.tenants.first().map(|t| t.id.clone())
            }
        };
        if !was_active {
            return Ok(());
        }
        match fallback {
            Some(next) => {
                if let Err(e) = self.switch_tenant(next.as_str()) {
                    warn!(tenant_id = %next, error = %e, "Could not switch away from deleted tenant");
                }
            }
            None => {
                let default_id = TenantScope::parse(&self.resolver.config().default_tenant_id);
                self.resolver.replace_active(default_id);
            }
        }
        Ok(())
    }
}
