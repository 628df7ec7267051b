//! Integration tests for the in-process remote.

use vitrine_core::error::VitrineError;
use vitrine_core::models::tenant::{CreateTenant, TenantScope};
use vitrine_core::repository::{DocumentRepository, TenantRepository};
use vitrine_remote::{MemoryRemote, RemoteOp};

fn create_input(subdomain: &str) -> CreateTenant {
    CreateTenant {
        name: format!("{subdomain} shop"),
        subdomain: subdomain.into(),
        contact_email: "owner@example.com".into(),
        contact_name: None,
        admin_email: "admin@example.com".into(),
        admin_password: "correct-horse".into(),
        plan: None,
    }
}

#[tokio::test]
async fn create_list_and_delete() {
    let remote = MemoryRemote::new();
    let a = remote.create(create_input("alpha")).await.unwrap();
    let b = remote.create(create_input("beta")).await.unwrap();

    let listed = remote.list_tenants().await.unwrap();
    assert_eq!(listed[0].id, b.id, "newest first");
    assert_eq!(listed[1].id, a.id);

    remote.delete(&a.id).await.unwrap();
    assert_eq!(remote.list_tenants().await.unwrap().len(), 1);
    assert!(matches!(
        remote.delete(&a.id).await,
        Err(VitrineError::NotFound { .. })
    ));
}

#[tokio::test]
async fn duplicate_subdomain_is_rejected() {
    let remote = MemoryRemote::new();
    remote.create(create_input("alpha")).await.unwrap();
    let err = remote.create(create_input("ALPHA")).await.unwrap_err();
    assert!(matches!(err, VitrineError::Validation { .. }));
}

#[tokio::test]
async fn injected_failures_are_counted_and_recoverable() {
    let remote = MemoryRemote::new();
    let tenant = TenantScope::parse("t1").unwrap();
    remote.fail(RemoteOp::SaveDocument);

    assert!(remote.save(&tenant, "tags", &vec!["new"]).await.is_err());
    assert!(remote.document(&tenant, "tags").is_none());

    remote.recover(RemoteOp::SaveDocument);
    remote.save(&tenant, "tags", &vec!["new"]).await.unwrap();
    assert_eq!(remote.calls(RemoteOp::SaveDocument), 2);

    let tags: Option<Vec<String>> = remote.get(&tenant, "tags").await.unwrap();
    assert_eq!(tags, Some(vec!["new".to_string()]));
}
