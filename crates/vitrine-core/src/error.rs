//! Error types for the Vitrine client core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VitrineError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Tenant is locked to this host: {tenant_id}")]
    TenantLocked { tenant_id: String },

    #[error("No tenant configured for {slug}")]
    TenantUnresolved { slug: String },

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for VitrineError {
    fn from(err: serde_json::Error) -> Self {
        VitrineError::Serialization(err.to_string())
    }
}

pub type VitrineResult<T> = Result<T, VitrineError>;
