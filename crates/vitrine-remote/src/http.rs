//! REST/JSON implementation of the repository traits.
//!
//! Endpoints (all JSON bodies are wrapped as `{"data": ...}`):
//!
//! | operation | request |
//! |---|---|
//! | list tenants | `GET /api/tenants` |
//! | resolve slug | `GET /api/tenants/resolve/{slug}` (404: unknown) |
//! | create tenant | `POST /api/tenants` |
//! | delete tenant | `DELETE /api/tenants/{id}` |
//! | read document | `GET /api/tenant-data/{tenant}/{collection}` (404: absent) |
//! | write document | `PUT /api/tenant-data/{tenant}/{collection}` |

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;
use vitrine_core::error::VitrineResult;
use vitrine_core::models::chat::ChatMessage;
use vitrine_core::models::subscription::SubscriptionRecord;
use vitrine_core::models::tenant::{
    CreateTenant, ResolvedTenant, Tenant, TenantPlan, TenantScope, TenantStatus,
};
use vitrine_core::repository::{
    ChatRepository, DocumentRepository, TenantRepository, collections,
};

use crate::config::RemoteConfig;
use crate::error::RemoteError;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct Payload<'a, T> {
    data: &'a T,
}

/// Wire-side tenant row. Older backends send `_id` instead of `id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenantDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    subdomain: String,
    #[serde(default)]
    custom_domain: Option<String>,
    #[serde(default)]
    status: Option<TenantStatus>,
    #[serde(default)]
    plan: Option<TenantPlan>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    subscription: Option<SubscriptionRecord>,
}

impl TenantDocument {
    fn scope(&self) -> Option<TenantScope> {
        self.id
            .as_deref()
            .and_then(TenantScope::parse)
            .or_else(|| self.mongo_id.as_deref().and_then(TenantScope::parse))
    }

    fn into_tenant(self) -> Option<Tenant> {
        let id = self.scope()?;
        Some(Tenant {
            id,
            name: self.name,
            subdomain: self.subdomain,
            custom_domain: self.custom_domain.filter(|d| !d.trim().is_empty()),
            status: self.status.unwrap_or_default(),
            plan: self.plan.unwrap_or_default(),
            created_at: self.created_at,
            subscription: self.subscription,
        })
    }

    fn into_resolved(self) -> Option<ResolvedTenant> {
        let id = self.scope()?;
        Some(ResolvedTenant {
            id,
            name: self.name,
            subdomain: self.subdomain,
        })
    }
}

/// HTTP client for the storefront backend.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|_| RemoteError::InvalidUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(config.base_url.clone()));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode the `data` envelope. `Ok(None)` on 404.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<Option<T>, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        Ok(Some(envelope.data))
    }

    /// Send and require a success status, ignoring the body.
    async fn execute(&self, builder: RequestBuilder) -> Result<(), RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn put_document<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&["tenant-data", tenant_id.as_str(), collection])?;
        debug!(tenant_id = %tenant_id, collection, "Saving document");
        self.execute(self.request(Method::PUT, url).json(&Payload { data }))
            .await
    }
}

impl TenantRepository for HttpRemote {
    async fn list_tenants(&self) -> VitrineResult<Vec<Tenant>> {
        let url = self.endpoint(&["tenants"])?;
        let rows: Vec<TenantDocument> = self
            .fetch(self.request(Method::GET, url))
            .await?
            .unwrap_or_default();
        let mut tenants = Vec::with_capacity(rows.len());
        for row in rows {
            let name = row.name.clone();
            match row.into_tenant() {
                Some(tenant) => tenants.push(tenant),
                None => warn!(name = %name, "Skipping tenant without id"),
            }
        }
        Ok(tenants)
    }

    async fn resolve_by_subdomain(&self, slug: &str) -> VitrineResult<Option<ResolvedTenant>> {
        let url = self.endpoint(&["tenants", "resolve", slug])?;
        let row: Option<TenantDocument> = self.fetch(self.request(Method::GET, url)).await?;
        Ok(row.and_then(TenantDocument::into_resolved))
    }

    async fn create(&self, input: CreateTenant) -> VitrineResult<Tenant> {
        let url = self.endpoint(&["tenants"])?;
        let row: Option<TenantDocument> = self
            .fetch(self.request(Method::POST, url).json(&input))
            .await?;
        row.and_then(TenantDocument::into_tenant).ok_or_else(|| {
            RemoteError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                body: "tenant creation returned no tenant".into(),
            }
            .into()
        })
    }

    async fn delete(&self, id: &TenantScope) -> VitrineResult<()> {
        let url = self.endpoint(&["tenants", id.as_str()])?;
        Ok(self.execute(self.request(Method::DELETE, url)).await?)
    }
}

impl DocumentRepository for HttpRemote {
    async fn get<T: DeserializeOwned + Send>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
    ) -> VitrineResult<Option<T>> {
        let url = self.endpoint(&["tenant-data", tenant_id.as_str(), collection])?;
        let data: Option<Option<T>> = self.fetch(self.request(Method::GET, url)).await?;
        Ok(data.flatten())
    }

    async fn save<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> VitrineResult<()> {
        Ok(self.put_document(tenant_id, collection, data).await?)
    }

    async fn save_immediate<T: Serialize + Sync>(
        &self,
        tenant_id: &TenantScope,
        collection: &str,
        data: &T,
    ) -> VitrineResult<()> {
        Ok(self.put_document(tenant_id, collection, data).await?)
    }
}

impl ChatRepository for HttpRemote {
    async fn get_chat_messages(&self, tenant_id: &TenantScope) -> VitrineResult<Vec<ChatMessage>> {
        let messages: Option<Vec<ChatMessage>> =
            DocumentRepository::get(self, tenant_id, collections::CHAT_MESSAGES).await?;
        Ok(messages.unwrap_or_default())
    }

    async fn save_chat_messages(
        &self,
        tenant_id: &TenantScope,
        messages: &[ChatMessage],
    ) -> VitrineResult<()> {
        Ok(self
            .put_document(tenant_id, collections::CHAT_MESSAGES, &messages)
            .await?)
    }
}
