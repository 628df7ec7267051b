//! Tenant resolution error types.

use thiserror::Error;
use vitrine_core::error::VitrineError;

#[derive(Debug, Error)]
pub enum TenantError {
    /// A switch was attempted on a host bound to a different tenant.
    /// This is a permission boundary, not a retryable failure.
    #[error("host is locked to tenant {tenant_id}")]
    HostLocked { tenant_id: String },

    #[error("no storefront configured for {slug}")]
    NoStorefront { slug: String },

    #[error("tenant id must not be empty")]
    EmptyTenantId,

    #[error("remote call failed: {0}")]
    Remote(#[from] VitrineError),
}

impl From<TenantError> for VitrineError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::HostLocked { tenant_id } => VitrineError::TenantLocked { tenant_id },
            TenantError::NoStorefront { slug } => VitrineError::TenantUnresolved { slug },
            TenantError::EmptyTenantId => VitrineError::Validation {
                message: "tenant id must not be empty".into(),
            },
            TenantError::Remote(inner) => inner,
        }
    }
}
