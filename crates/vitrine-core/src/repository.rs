//! Repository trait definitions for the remote persistence API.
//!
//! All repository operations are async. Tenant-scoped repositories take the
//! [`TenantScope`] explicitly so no call can silently hit another tenant.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::VitrineResult;
use crate::models::{
    chat::ChatMessage,
    tenant::{CreateTenant, ResolvedTenant, Tenant, TenantScope},
};

/// Well-known document collections.
pub mod collections {
    pub const CHAT_MESSAGES: &str = "chat_messages";
    pub const PRODUCTS: &str = "products";
    pub const THEME_CONFIG: &str = "theme_config";
    pub const WEBSITE_CONFIG: &str = "website_config";
    pub const CATEGORIES: &str = "categories";
    pub const BRANDS: &str = "brands";
    pub const TAGS: &str = "tags";
    pub const LANDING_PAGES: &str = "landing_pages";
    /// Tenant list, cached under the global scope.
    pub const TENANTS: &str = "tenants";

    /// Documents that are dropped from the local cache when a host's tenant
    /// turns out to differ from the one the cache was written for.
    pub const TENANT_BOUND: &[&str] = &[
        PRODUCTS,
        THEME_CONFIG,
        WEBSITE_CONFIG,
        CATEGORIES,
        BRANDS,
        TAGS,
    ];
}

// ---------------------------------------------------------------------------
// Tenants (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Authoritative tenant list, newest first.
    fn list_tenants(&self) -> impl Future<Output = VitrineResult<Vec<Tenant>>> + Send;

    /// Resolve a single subdomain slug without loading the whole list.
    fn resolve_by_subdomain(
        &self,
        slug: &str,
    ) -> impl Future<Output = VitrineResult<Option<ResolvedTenant>>> + Send;

    fn create(&self, input: CreateTenant) -> impl Future<Output = VitrineResult<Tenant>> + Send;

    fn delete(&self, id: &TenantScope) -> impl Future<Output = VitrineResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped documents
// ---------------------------------------------------------------------------

pub trait DocumentRepository: Send + Sync {
    /// Fetch a document. `Ok(None)` means the tenant has no such document.
    fn get<T: DeserializeOwned + Send>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
    ) -> impl Future<Output = VitrineResult<Option<T>>> + Send;

    /// Store a document. Callers may treat this as fire-and-forget.
    fn save<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> impl Future<Output = VitrineResult<()>> + Send;

    /// Store a document, bypassing any batching; completes only once the
    /// remote acknowledged the write.
    fn save_immediate<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> impl Future<Output = VitrineResult<()>> + Send;

    /// Fetch a document, substituting `fallback` when it does not exist.
    fn get_or<T: DeserializeOwned + Send>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        fallback: T,
    ) -> impl Future<Output = VitrineResult<T>> + Send {
        async move { Ok(self.get(tenant_id, collection).await?.unwrap_or(fallback)) }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

pub trait ChatRepository: Send + Sync {
    /// Current chat log of a tenant. Never served from a cache.
    fn get_chat_messages(
        &self,
        tenant_id: &TenantScope,
    ) -> impl Future<Output = VitrineResult<Vec<ChatMessage>>> + Send;

    /// Replace the tenant's chat log with `messages`.
    fn save_chat_messages(
        &self,
        tenant_id: &TenantScope,
        messages: &[ChatMessage],
    ) -> impl Future<Output = VitrineResult<()>> + Send;
}
