//! Hostname and slug utilities.
//!
//! Pure functions: nothing here touches storage. The resolver combines these
//! with the cached mappings.

use std::fmt;

use crate::config::TenantConfig;

/// Maximum length of a DNS label, and thus of a slug.
pub const MAX_SLUG_LEN: usize = 63;

/// Lowercase `value`, keep only `[a-z0-9-]`, strip leading/trailing hyphens
/// and cut to 63 characters.
pub fn sanitize_subdomain_slug(value: &str) -> String {
    let kept: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    kept.trim_matches('-').chars().take(MAX_SLUG_LEN).collect()
}

/// Lowercase a configured domain and strip its scheme and one trailing slash.
pub fn normalize_domain_value(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme
        .strip_suffix('/')
        .unwrap_or(without_scheme)
        .to_string()
}

pub fn is_localhost(hostname: &str) -> bool {
    hostname == "localhost" || hostname.ends_with(".localhost") || hostname.starts_with("127.")
}

/// A sanitized, non-reserved tenant slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubdomainSlug(String);

impl SubdomainSlug {
    /// Sanitize `raw`; `None` when the result is empty or reserved.
    pub fn parse(raw: &str, config: &TenantConfig) -> Option<Self> {
        let slug = sanitize_subdomain_slug(raw);
        if slug.is_empty() || config.is_reserved_slug(&slug) {
            return None;
        }
        Some(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this slug is the configured default (unlocked) slug.
    pub fn is_default(&self, config: &TenantConfig) -> bool {
        !config.default_tenant_slug.is_empty() && self.0 == config.default_tenant_slug
    }
}

impl fmt::Display for SubdomainSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a hostname sits relative to the primary domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostClass {
    /// `localhost`, `*.localhost` or `127.*`. Carries the first label when
    /// the host has more than one.
    Localhost { label: Option<String> },
    /// The primary domain itself or its `www.` alias.
    PrimaryApex,
    /// Everything left of `.<primary>`.
    PrimarySubdomain { label: String },
    /// A host outside the primary domain while one is configured.
    CustomDomain,
    /// No primary domain configured; carries the first label of hosts with
    /// more than two labels.
    Bare { label: Option<String> },
}

pub fn classify_host(hostname: &str, config: &TenantConfig) -> HostClass {
    let hostname = hostname.to_lowercase();
    let segments: Vec<&str> = hostname.split('.').collect();

    if is_localhost(&hostname) {
        let loopback_ip = hostname.starts_with("127.");
        let label = (!loopback_ip && segments.len() > 1).then(|| segments[0].to_string());
        return HostClass::Localhost { label };
    }

    let primary = config.primary_domain.as_str();
    if !primary.is_empty() {
        if hostname == primary || hostname == format!("www.{primary}") {
            return HostClass::PrimaryApex;
        }
        if let Some(label) = hostname.strip_suffix(&format!(".{primary}")) {
            return HostClass::PrimarySubdomain {
                label: label.to_string(),
            };
        }
        if segments.len() >= 2 {
            return HostClass::CustomDomain;
        }
    }

    let label = (segments.len() > 2).then(|| segments[0].to_string());
    HostClass::Bare { label }
}

/// Slug implied by a non-custom host class. `None` for custom domains, for
/// reserved labels and for apex hosts without a default slug.
pub fn slug_for_class(class: &HostClass, config: &TenantConfig) -> Option<SubdomainSlug> {
    match class {
        HostClass::Localhost { label: Some(label) }
        | HostClass::PrimarySubdomain { label }
        | HostClass::Bare { label: Some(label) } => SubdomainSlug::parse(label, config),
        HostClass::Localhost { label: None }
        | HostClass::PrimaryApex
        | HostClass::Bare { label: None } => default_slug(config),
        HostClass::CustomDomain => None,
    }
}

fn default_slug(config: &TenantConfig) -> Option<SubdomainSlug> {
    if config.default_tenant_slug.is_empty() {
        None
    } else {
        Some(SubdomainSlug(config.default_tenant_slug.clone()))
    }
}

/// Privilege class of a host, used to pick the initial view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    AdminSubdomain,
    SuperAdminSubdomain,
    TenantLoginPortal,
    Tenant,
}

impl HostKind {
    pub fn detect(hostname: &str, config: &TenantConfig) -> Self {
        let hostname = hostname.to_lowercase();
        let is_portal = config
            .tenant_login_portals
            .iter()
            .any(|portal| hostname == *portal || hostname == format!("www.{portal}"));
        if is_portal {
            return HostKind::TenantLoginPortal;
        }
        let first = hostname.split('.').next().unwrap_or_default();
        let multi_label = hostname.contains('.');
        if multi_label && first == config.super_admin_host_label {
            HostKind::SuperAdminSubdomain
        } else if multi_label && first == config.admin_host_label {
            HostKind::AdminSubdomain
        } else {
            HostKind::Tenant
        }
    }

    /// Hosts that never show storefront content.
    pub fn is_privileged(self) -> bool {
        matches!(
            self,
            HostKind::SuperAdminSubdomain | HostKind::TenantLoginPortal
        )
    }
}
