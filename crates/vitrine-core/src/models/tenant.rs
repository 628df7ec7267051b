//! Tenant domain model.
//!
//! Tenants are isolated storefronts. Catalog, orders, chat and theme data
//! belong to exactly one tenant and are addressed through its [`TenantScope`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::subscription::SubscriptionRecord;

/// Opaque identifier of a tenant as used for storage keys and remote calls.
///
/// Never empty: construct through [`TenantScope::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantScope(String);

impl TenantScope {
    /// Trim `raw` and wrap it, rejecting blank identifiers.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantScope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantScope {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "tenant id must not be empty".to_string())
    }
}

impl From<TenantScope> for String {
    fn from(scope: TenantScope) -> Self {
        scope.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[default]
    Active,
    Trialing,
    Suspended,
    Inactive,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TenantPlan {
    #[default]
    Starter,
    Growth,
    Enterprise,
}

/// A storefront tenant as listed by the remote tenant API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantScope,
    /// Human-readable name.
    pub name: String,
    /// Subdomain label under the primary domain (e.g. `shoe-store`).
    /// May be stored un-normalized; compare through the slug sanitizer.
    #[serde(default)]
    pub subdomain: String,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub status: TenantStatus,
    #[serde(default)]
    pub plan: TenantPlan,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription: Option<SubscriptionRecord>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenant {
    pub name: String,
    pub subdomain: String,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub admin_email: String,
    pub admin_password: String,
    pub plan: Option<TenantPlan>,
}

/// Minimal tenant identity returned by the single-slug resolution endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTenant {
    pub id: TenantScope,
    pub name: String,
    pub subdomain: String,
}

/// Cached mapping of a custom domain to the tenant serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomainTenant {
    pub tenant_id: TenantScope,
    pub subdomain: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_rejects_blank_ids() {
        assert!(TenantScope::parse("").is_none());
        assert!(TenantScope::parse("   ").is_none());
        assert_eq!(TenantScope::parse(" t-1 ").unwrap().as_str(), "t-1");
    }

    #[test]
    fn tenant_deserializes_with_missing_optional_fields() {
        let tenant: Tenant =
            serde_json::from_str(r#"{"id":"t1","name":"Shoes","subdomain":"Shoe-Store"}"#)
                .unwrap();
        assert_eq!(tenant.id.as_str(), "t1");
        assert_eq!(tenant.status, TenantStatus::Active);
        assert!(tenant.subscription.is_none());
    }

    #[test]
    fn blank_tenant_id_fails_to_deserialize() {
        let parsed = serde_json::from_str::<Tenant>(r#"{"id":"","name":"x"}"#);
        assert!(parsed.is_err());
    }
}
