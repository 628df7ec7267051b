//! In-process implementation of the repository traits.
//!
//! Clones share state, so a test can keep one handle for assertions while the
//! code under test owns another.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use vitrine_core::error::{VitrineError, VitrineResult};
use vitrine_core::models::chat::ChatMessage;
use vitrine_core::models::tenant::{CreateTenant, ResolvedTenant, Tenant, TenantScope};
use vitrine_core::repository::{
    ChatRepository, DocumentRepository, TenantRepository, collections,
};

/// Operations that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    ListTenants,
    ResolveTenant,
    CreateTenant,
    DeleteTenant,
    GetDocument,
    SaveDocument,
    GetChat,
    SaveChat,
}

#[derive(Debug, Default)]
struct MemoryState {
    tenants: Vec<Tenant>,
    documents: HashMap<(TenantScope, String), serde_json::Value>,
    failing: HashSet<RemoteOp>,
    calls: HashMap<RemoteOp, usize>,
    next_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenants(tenants: Vec<Tenant>) -> Self {
        let remote = Self::new();
        remote.lock().tenants = tenants;
        remote
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and fail it if `op` is marked failing.
    fn enter(&self, op: RemoteOp) -> VitrineResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if state.failing.contains(&op) {
            return Err(VitrineError::Remote(format!("{op:?} unavailable")));
        }
        Ok(state)
    }

    /// Make every subsequent `op` call fail until [`recover`](Self::recover).
    pub fn fail(&self, op: RemoteOp) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: RemoteOp) {
        self.lock().failing.remove(&op);
    }

    pub fn calls(&self, op: RemoteOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        let mut state = self.lock();
        state.tenants.retain(|t| t.id != tenant.id);
        state.tenants.push(tenant);
    }

    /// Seed a tenant's chat log without counting a save.
    pub fn set_chat_messages(&self, tenant_id: &TenantScope, messages: &[ChatMessage]) {
        let value = serde_json::to_value(messages).unwrap_or_default();
        self.lock()
            .documents
            .insert((tenant_id.clone(), collections::CHAT_MESSAGES.into()), value);
    }

    pub fn chat_messages(&self, tenant_id: &TenantScope) -> Vec<ChatMessage> {
        self.document(tenant_id, collections::CHAT_MESSAGES)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn document(&self, tenant_id: &TenantScope, collection: &str) -> Option<serde_json::Value> {
        self.lock()
            .documents
            .get(&(tenant_id.clone(), collection.to_string()))
            .cloned()
    }

    fn store_document<T: Serialize>(
        &self,
        op: RemoteOp,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> VitrineResult<()> {
        let value = serde_json::to_value(data)?;
        let mut state = self.enter(op)?;
        state
            .documents
            .insert((tenant_id.clone(), collection.to_string()), value);
        Ok(())
    }
}

impl TenantRepository for MemoryRemote {
    async fn list_tenants(&self) -> VitrineResult<Vec<Tenant>> {
        let state = self.enter(RemoteOp::ListTenants)?;
        Ok(state.tenants.iter().rev().cloned().collect())
    }

    async fn resolve_by_subdomain(&self, slug: &str) -> VitrineResult<Option<ResolvedTenant>> {
        let state = self.enter(RemoteOp::ResolveTenant)?;
        Ok(state
            .tenants
            .iter()
            .find(|t| t.subdomain.eq_ignore_ascii_case(slug))
            .map(|t| ResolvedTenant {
                id: t.id.clone(),
                name: t.name.clone(),
                subdomain: t.subdomain.clone(),
            }))
    }

    async fn create(&self, input: CreateTenant) -> VitrineResult<Tenant> {
        let mut state = self.enter(RemoteOp::CreateTenant)?;
        if state
            .tenants
            .iter()
            .any(|t| t.subdomain.eq_ignore_ascii_case(&input.subdomain))
        {
            return Err(VitrineError::Validation {
                message: format!("subdomain {} is taken", input.subdomain),
            });
        }
        state.next_id += 1;
        let id = TenantScope::parse(&format!("tenant-{}", state.next_id))
            .ok_or_else(|| VitrineError::Internal("generated empty tenant id".into()))?;
        let tenant = Tenant {
            id,
            name: input.name,
            subdomain: input.subdomain,
            custom_domain: None,
            status: Default::default(),
            plan: input.plan.unwrap_or_default(),
            created_at: Some(Utc::now()),
            subscription: None,
        };
        state.tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn delete(&self, id: &TenantScope) -> VitrineResult<()> {
        let mut state = self.enter(RemoteOp::DeleteTenant)?;
        let before = state.tenants.len();
        state.tenants.retain(|t| t.id != *id);
        if state.tenants.len() == before {
            return Err(VitrineError::NotFound {
                entity: "tenant".into(),
                id: id.to_string(),
            });
        }
        state.documents.retain(|(tenant, _), _| tenant != id);
        Ok(())
    }
}

impl DocumentRepository for MemoryRemote {
    async fn get<T: DeserializeOwned + Send>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
    ) -> VitrineResult<Option<T>> {
        let value = {
            let state = self.enter(RemoteOp::GetDocument)?;
            state
                .documents
                .get(&(tenant_id.clone(), collection.to_string()))
                .cloned()
        };
        match value {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    async fn save<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> VitrineResult<()> {
        self.store_document(RemoteOp::SaveDocument, tenant_id, collection, data)
    }

    async fn save_immediate<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> VitrineResult<()> {
        self.store_document(RemoteOp::SaveDocument, tenant_id, collection, data)
    }
}

impl ChatRepository for MemoryRemote {
    async fn get_chat_messages(&self, tenant_id: &TenantScope) -> VitrineResult<Vec<ChatMessage>> {
        let value = {
            let state = self.enter(RemoteOp::GetChat)?;
            state
                .documents
                .get(&(tenant_id.clone(), collections::CHAT_MESSAGES.to_string()))
                .cloned()
        };
        match value {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_chat_messages(
        &self,
        tenant_id: &TenantScope,
        messages: &[ChatMessage],
    ) -> VitrineResult<()> {
        self.store_document(RemoteOp::SaveChat, tenant_id, collections::CHAT_MESSAGES, &messages)
    }
}
