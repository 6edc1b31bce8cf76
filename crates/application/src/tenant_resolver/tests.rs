use std::sync::Arc;

use chrono::Utc;

use paygate_core::{AppError, AuthError, TenantId};
use paygate_domain::{Tenant, TenantStatus};

use crate::api_key_crypto::digest_api_key;
use crate::tenant_ports::{CredentialCipher, StoredTenant, TenantRepository};
use crate::test_support::{FakeTenantRepository, ReversingCipher};

use super::TenantResolver;

const ACTIVE_KEY: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90";
const SUSPENDED_KEY: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

async fn seeded_resolver() -> (TenantResolver, TenantId, TenantId) {
    let repository = Arc::new(FakeTenantRepository::default());
    let cipher = ReversingCipher;

    let active = Tenant::new(TenantId::new(), "Acme", Utc::now()).unwrap_or_else(|_| unreachable!());
    let suspended = Tenant::new(TenantId::new(), "Globex", Utc::now())
        .unwrap_or_else(|_| unreachable!())
        .with_status(TenantStatus::Suspended);

    for (tenant, key, credential) in [
        (active.clone(), ACTIVE_KEY, "sk_test_acme"),
        (suspended.clone(), SUSPENDED_KEY, "sk_test_globex"),
    ] {
        let result = repository
            .create_tenant(StoredTenant {
                tenant,
                api_key_digest: digest_api_key(key),
                encrypted_provider_credential: cipher
                    .encrypt(credential.as_bytes())
                    .unwrap_or_default(),
            })
            .await;
        assert!(result.is_ok());
    }

    (
        TenantResolver::new(repository, Arc::new(ReversingCipher)),
        active.id(),
        suspended.id(),
    )
}

#[tokio::test]
async fn active_key_resolves_to_its_tenant_with_credential() {
    let (resolver, active_id, _) = seeded_resolver().await;

    let context = resolver
        .resolve(Some(ACTIVE_KEY))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(context.tenant_id(), active_id);
    assert_eq!(context.tenant_name(), "Acme");
    assert_eq!(context.credential().expose(), "sk_test_acme");
}

#[tokio::test]
async fn missing_key_fails_with_missing() {
    let (resolver, _, _) = seeded_resolver().await;

    for presented in [None, Some(""), Some("   ")] {
        assert!(matches!(
            resolver.resolve(presented).await,
            Err(AppError::Auth(AuthError::Missing))
        ));
    }
}

#[tokio::test]
async fn unknown_and_malformed_keys_fail_alike() {
    let (resolver, _, _) = seeded_resolver().await;
    let near_miss = ACTIVE_KEY.to_uppercase();
    let zeros = "0".repeat(64);
    let oversized = "x".repeat(4096);

    for presented in ["short", near_miss.as_str(), zeros.as_str(), oversized.as_str()] {
        assert!(matches!(
            resolver.resolve(Some(presented)).await,
            Err(AppError::Auth(AuthError::NotFound))
        ));
    }
}

#[tokio::test]
async fn suspended_tenant_fails_with_suspended_not_not_found() {
    let (resolver, _, _) = seeded_resolver().await;

    assert!(matches!(
        resolver.resolve(Some(SUSPENDED_KEY)).await,
        Err(AppError::Auth(AuthError::Suspended))
    ));
}

#[tokio::test]
async fn load_context_rejects_suspended_and_unknown_tenants() {
    let (resolver, active_id, suspended_id) = seeded_resolver().await;

    assert!(resolver.load_context(active_id).await.is_ok());
    assert!(matches!(
        resolver.load_context(suspended_id).await,
        Err(AppError::Auth(AuthError::Suspended))
    ));
    assert!(matches!(
        resolver.load_context(TenantId::new()).await,
        Err(AppError::NotFound(_))
    ));
}
