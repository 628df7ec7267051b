//! Tenant resolution configuration.

use std::time::Duration;

use crate::domain::{normalize_domain_value, sanitize_subdomain_slug};

/// Subdomain labels that can never name a tenant.
pub const DEFAULT_RESERVED_SLUGS: &[&str] = &[
    "www",
    "admin",
    "adminlogin",
    "superadmin",
    "login",
    "app",
    "api",
    "dashboard",
    "tenant",
    "support",
    "cdn",
    "static",
];

/// Configuration for tenant resolution and the scoped cache.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    /// Normalized primary domain (e.g. `example.com`). Empty disables
    /// subdomain-of-primary and custom-domain detection.
    pub primary_domain: String,
    /// Sanitized slug served on the bare primary domain. Empty for none.
    pub default_tenant_slug: String,
    /// Tenant id used when nothing else resolves (default: `default`).
    pub default_tenant_id: String,
    /// Sanitized reserved subdomain labels.
    pub reserved_slugs: Vec<String>,
    /// Leftmost label of the tenant admin host (default: `admin`).
    pub admin_host_label: String,
    /// Leftmost label of the platform operator host (default: `superadmin`).
    pub super_admin_host_label: String,
    /// Hostnames of the tenant login portal (`www.` variants match too).
    pub tenant_login_portals: Vec<String>,
    /// Lifetime of a cached custom-domain mapping (default: 24 hours).
    pub custom_domain_ttl: Duration,
    /// Lifetime of a scoped cache entry (default: 5 minutes).
    pub cache_ttl: Duration,
}

impl TenantConfig {
    pub fn with_primary_domain(mut self, domain: &str) -> Self {
        self.primary_domain = normalize_domain_value(domain);
        self
    }

    pub fn with_default_tenant_slug(mut self, slug: &str) -> Self {
        self.default_tenant_slug = sanitize_subdomain_slug(slug);
        self
    }

    pub fn with_default_tenant_id(mut self, id: &str) -> Self {
        self.default_tenant_id = id.trim().to_string();
        self
    }

    /// Whether `slug` (sanitized first) is one of the reserved labels.
    pub fn is_reserved_slug(&self, slug: &str) -> bool {
        let slug = sanitize_subdomain_slug(slug);
        !slug.is_empty() && self.reserved_slugs.iter().any(|r| *r == slug)
    }

    pub fn with_tenant_login_portal(mut self, host: &str) -> Self {
        self.tenant_login_portals.push(normalize_domain_value(host));
        self
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            primary_domain: String::new(),
            default_tenant_slug: String::new(),
            default_tenant_id: "default".into(),
            reserved_slugs: DEFAULT_RESERVED_SLUGS.iter().map(|s| s.to_string()).collect(),
            admin_host_label: "admin".into(),
            super_admin_host_label: "superadmin".into(),
            tenant_login_portals: Vec::new(),
            custom_domain_ttl: Duration::from_secs(24 * 60 * 60),
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}
