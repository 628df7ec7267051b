//! Persisted session user.
//!
//! The authenticated user is kept in local storage under
//! [`keys::SESSION_USER`](crate::storage::keys::SESSION_USER). Older records
//! carry the tenant as a nested object, newer ones as a flat `tenantId`.

use serde::{Deserialize, Serialize};

use super::tenant::TenantScope;
use crate::storage::{KeyValueStore, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Admin,
    TenantAdmin,
    SuperAdmin,
    Staff,
}

impl UserRole {
    /// Roles allowed into the tenant admin panel.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::TenantAdmin | Self::SuperAdmin)
    }

    pub fn is_super_admin(self) -> bool {
        self == Self::SuperAdmin
    }

    /// Roles that land directly in the admin shell on a back-office host.
    pub fn is_back_office(self) -> bool {
        matches!(
            self,
            Self::Admin | Self::TenantAdmin | Self::SuperAdmin | Self::Staff
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "_id")]
    pub mongo_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub tenant: Option<TenantRef>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl SessionUser {
    /// Read the persisted session. Missing or malformed records yield `None`.
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        let raw = store.get_item(keys::SESSION_USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed session record");
                None
            }
        }
    }

    /// The tenant this session belongs to, in field-precedence order.
    pub fn tenant_scope(&self) -> Option<TenantScope> {
        let nested = self.tenant.as_ref();
        [
            self.tenant_id.as_deref(),
            nested.and_then(|t| t.id.as_deref()),
            nested.and_then(|t| t.mongo_id.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find_map(TenantScope::parse)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(UserRole::is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn tenant_scope_prefers_flat_field() {
        let user: SessionUser = serde_json::from_str(
            r#"{"name":"a","tenantId":"flat","tenant":{"id":"nested","_id":"mongo"}}"#,
        )
        .unwrap();
        assert_eq!(user.tenant_scope().unwrap().as_str(), "flat");
    }

    #[test]
    fn tenant_scope_falls_back_to_nested_ids() {
        let user: SessionUser =
            serde_json::from_str(r#"{"name":"a","tenant":{"_id":"mongo"}}"#).unwrap();
        assert_eq!(user.tenant_scope().unwrap().as_str(), "mongo");
    }

    #[test]
    fn malformed_session_is_ignored() {
        let store = MemoryStore::new();
        store.persist(keys::SESSION_USER, "{not json");
        assert!(SessionUser::load(&store).is_none());
    }

    #[test]
    fn role_classes() {
        assert!(UserRole::TenantAdmin.is_admin());
        assert!(!UserRole::Staff.is_admin());
        assert!(UserRole::Staff.is_back_office());
        assert!(!UserRole::Customer.is_back_office());
    }
}
