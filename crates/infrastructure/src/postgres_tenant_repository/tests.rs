use chrono::Utc;
use paygate_application::{StoredTenant, TenantRepository, digest_api_key};
use paygate_core::{AppError, TenantId};
use paygate_domain::{Tenant, TenantStatus};
use uuid::Uuid;

use super::PostgresTenantRepository;
use crate::postgres_test_support::test_pool;

fn stored_tenant(name: &str) -> StoredTenant {
    StoredTenant {
        tenant: Tenant::new(TenantId::new(), name, Utc::now()).unwrap_or_else(|_| unreachable!()),
        api_key_digest: digest_api_key(Uuid::new_v4().to_string().as_str()),
        encrypted_provider_credential: vec![9, 8, 7, 6],
    }
}

#[tokio::test]
async fn created_tenant_is_found_by_digest() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRepository::new(pool);
    let stored = stored_tenant("Acme");
    let digest = stored.api_key_digest.clone();
    let tenant_id = stored.tenant.id();
    assert!(repository.create_tenant(stored).await.is_ok());

    let found = repository
        .find_by_api_key_digest(digest.as_str())
        .await
        .unwrap_or_else(|_| unreachable!());

    let found = found.unwrap_or_else(|| unreachable!());
    assert_eq!(found.tenant.id(), tenant_id);
    assert_eq!(found.encrypted_provider_credential, vec![9, 8, 7, 6]);
    assert!(matches!(repository.find_tenant(tenant_id).await, Ok(Some(_))));
}

#[tokio::test]
async fn duplicate_digest_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRepository::new(pool);
    let first = stored_tenant("Acme");
    let mut second = stored_tenant("Globex");
    second.api_key_digest = first.api_key_digest.clone();
    assert!(repository.create_tenant(first).await.is_ok());

    let result = repository.create_tenant(second).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn suspension_is_persisted() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresTenantRepository::new(pool);
    let stored = stored_tenant("Initech");
    let tenant_id = stored.tenant.id();
    assert!(repository.create_tenant(stored).await.is_ok());

    let suspended = repository
        .update_status(tenant_id, TenantStatus::Suspended)
        .await
        .unwrap_or_else(|_| unreachable!());
    let reloaded = repository
        .find_tenant(tenant_id)
        .await
        .unwrap_or_else(|_| unreachable!())
        .unwrap_or_else(|| unreachable!());

    assert_eq!(suspended.status(), TenantStatus::Suspended);
    assert_eq!(reloaded.tenant.status(), TenantStatus::Suspended);
    assert!(matches!(
        repository
            .update_status(TenantId::new(), TenantStatus::Active)
            .await,
        Err(AppError::NotFound(_))
    ));
}
