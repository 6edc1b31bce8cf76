use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use paygate_application::{
    CredentialCipher, ProviderCaller, ResourceOrchestrator, RetryPolicy, TenantAdminService,
    TenantResolver,
};
use paygate_infrastructure::{
    AesCredentialCipher, InMemoryResourceRepository, InMemoryTenantRepository,
    SandboxPaymentProvider,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::build_router;
use crate::state::AppState;

const ADMIN_TOKEN: &str = "admin-token-admin-token-admin-token";
const ACME_KEY: &str = "acme_live_0123456789abcdef0123456789abcdef0123456789abcdef012345";
const GLOBEX_KEY: &str = "globex_live_0123456789abcdef0123456789abcdef0123456789abcdef0123";

fn test_router() -> Router {
    let tenant_repository = Arc::new(InMemoryTenantRepository::new());
    let cipher: Arc<dyn CredentialCipher> = Arc::new(AesCredentialCipher::new(&[7_u8; 32]));
    let caller = ProviderCaller::new(
        Arc::new(SandboxPaymentProvider::new()),
        RetryPolicy::immediate(3),
        Duration::from_secs(5),
    );

    let state = AppState {
        tenant_resolver: TenantResolver::new(tenant_repository.clone(), cipher.clone()),
        orchestrator: ResourceOrchestrator::new(Arc::new(InMemoryResourceRepository::new()), caller),
        tenant_admin_service: TenantAdminService::new(tenant_repository, cipher),
        admin_token: ADMIN_TOKEN.to_owned(),
        postgres_pool: None,
    };

    build_router(state, Duration::from_secs(30))
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
    idempotency_key: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(key) = idempotency_key {
        builder = builder.header("idempotency-key", key);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|_| unreachable!());

    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| unreachable!());
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn provision(router: &Router, name: &str, api_key: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/admin/tenants",
        Some(ADMIN_TOKEN),
        Some(json!({
            "name": name,
            "provider_credential": format!("sk_test_{name}"),
            "api_key": api_key,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["api_key"], api_key);

    body["data"]["id"].as_str().unwrap_or_default().to_owned()
}

async fn create_customer(router: &Router, api_key: &str, email: &str) -> Value {
    let (status, body) = send(
        router,
        Method::POST,
        "/v1/customers",
        Some(api_key),
        Some(json!({ "email": email, "display_name": "Ada Lovelace" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    body["data"].clone()
}

#[tokio::test]
async fn provisioned_tenant_creates_and_lists_customers() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;

    let customer = create_customer(&router, ACME_KEY, "ada@example.com").await;
    assert!(customer["id"].as_str().is_some());
    assert!(customer["provider_customer_id"].as_str().is_some());
    assert_eq!(customer["state"], "active");

    let (status, listed) = send(&router, Method::GET, "/v1/customers", Some(ACME_KEY), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["success"], true);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["id"], customer["id"]);

    let (status, rejected) =
        send(&router, Method::GET, "/v1/customers", Some(GLOBEX_KEY), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected["success"], false);
    assert_eq!(rejected["error"], "AuthError");
}

#[tokio::test]
async fn missing_and_unknown_keys_get_the_same_answer() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;

    let (missing_status, missing) = send(&router, Method::GET, "/v1/tax-rates", None, None, None).await;
    let (unknown_status, unknown) =
        send(&router, Method::GET, "/v1/tax-rates", Some("nope"), None, None).await;

    assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing, unknown);
}

#[tokio::test]
async fn repeated_create_with_idempotency_key_replays_the_record() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;
    let payload = json!({ "email": "ada@example.com", "display_name": "Ada" });

    let (first_status, first) = send(
        &router,
        Method::POST,
        "/v1/customers",
        Some(ACME_KEY),
        Some(payload.clone()),
        Some("signup-42"),
    )
    .await;
    let (second_status, second) = send(
        &router,
        Method::POST,
        "/v1/customers",
        Some(ACME_KEY),
        Some(payload),
        Some("signup-42"),
    )
    .await;
    let (conflict_status, conflict) = send(
        &router,
        Method::POST,
        "/v1/customers",
        Some(ACME_KEY),
        Some(json!({ "email": "grace@example.com", "display_name": "Grace" })),
        Some("signup-42"),
    )
    .await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(
        first["data"]["provider_customer_id"],
        second["data"]["provider_customer_id"]
    );
    assert_eq!(conflict_status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"], "ConflictError");
}

#[tokio::test]
async fn tenants_cannot_reach_each_others_records() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;
    provision(&router, "globex", GLOBEX_KEY).await;

    let customer = create_customer(&router, ACME_KEY, "ada@example.com").await;
    let uri = format!("/v1/customers/{}", customer["id"].as_str().unwrap_or_default());

    let (read_status, _) = send(&router, Method::GET, uri.as_str(), Some(GLOBEX_KEY), None, None).await;
    let (delete_status, _) =
        send(&router, Method::DELETE, uri.as_str(), Some(GLOBEX_KEY), None, None).await;
    let (own_status, own) = send(&router, Method::GET, uri.as_str(), Some(ACME_KEY), None, None).await;

    assert_eq!(read_status, StatusCode::NOT_FOUND);
    assert_eq!(delete_status, StatusCode::NOT_FOUND);
    assert_eq!(own_status, StatusCode::OK);
    assert_eq!(own["data"]["state"], "active");
}

#[tokio::test]
async fn subscription_lifecycle_runs_through_the_api() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;
    let customer = create_customer(&router, ACME_KEY, "ada@example.com").await;

    let (status, subscription) = send(
        &router,
        Method::POST,
        "/v1/subscriptions",
        Some(ACME_KEY),
        Some(json!({ "customer_id": customer["id"], "price_reference": "price_basic" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subscription["data"]["quantity"], 1);
    let subscription_id = subscription["data"]["id"].as_str().unwrap_or_default().to_owned();

    let (status, item) = send(
        &router,
        Method::POST,
        "/v1/subscription-items",
        Some(ACME_KEY),
        Some(json!({
            "subscription_id": subscription_id,
            "price_reference": "price_addon",
            "quantity": 2,
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["data"]["subscription_id"], subscription_id.as_str());

    let (status, items) = send(
        &router,
        Method::GET,
        format!("/v1/subscription-items?subscription_id={subscription_id}").as_str(),
        Some(ACME_KEY),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items["count"], 1);

    let (status, synced) = send(
        &router,
        Method::POST,
        format!("/v1/subscriptions/{subscription_id}/sync").as_str(),
        Some(ACME_KEY),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(synced["data"]["status"], "active");

    let (status, canceled) = send(
        &router,
        Method::DELETE,
        format!("/v1/subscriptions/{subscription_id}").as_str(),
        Some(ACME_KEY),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(canceled["data"]["state"], "canceled");
}

#[tokio::test]
async fn invalid_payloads_are_rejected_before_any_provider_call() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;

    let (bad_id_status, bad_id) = send(
        &router,
        Method::GET,
        "/v1/customers/not-a-uuid",
        Some(ACME_KEY),
        None,
        None,
    )
    .await;
    let (bad_rate_status, _) = send(
        &router,
        Method::POST,
        "/v1/tax-rates",
        Some(ACME_KEY),
        Some(json!({ "display_name": "VAT", "percentage": 140.0 })),
        None,
    )
    .await;

    assert_eq!(bad_id_status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id["error"], "ValidationError");
    assert_eq!(bad_rate_status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_bodies_and_queries_use_the_failure_envelope() {
    let router = test_router();
    provision(&router, "acme", ACME_KEY).await;

    let (missing_field_status, missing_field) = send(
        &router,
        Method::POST,
        "/v1/customers",
        Some(ACME_KEY),
        Some(json!({ "email": "a@b.com" })),
        None,
    )
    .await;
    let (bad_query_status, bad_query) = send(
        &router,
        Method::GET,
        "/v1/customers?limit=many",
        Some(ACME_KEY),
        None,
        None,
    )
    .await;
    let (no_body_status, no_body) =
        send(&router, Method::POST, "/v1/tax-rates", Some(ACME_KEY), None, None).await;

    assert_eq!(missing_field_status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_field["success"], false);
    assert_eq!(missing_field["error"], "ValidationError");
    assert!(
        missing_field["message"]
            .as_str()
            .is_some_and(|message| message.contains("display_name"))
    );
    assert_eq!(bad_query_status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_query["error"], "ValidationError");
    assert_eq!(no_body_status, StatusCode::BAD_REQUEST);
    assert_eq!(no_body["success"], false);

    let (listed_status, listed) =
        send(&router, Method::GET, "/v1/customers", Some(ACME_KEY), None, None).await;
    assert_eq!(listed_status, StatusCode::OK);
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn admin_routes_require_the_admin_token() {
    let router = test_router();

    let (without_status, _) = send(&router, Method::GET, "/admin/tenants", None, None, None).await;
    let (wrong_status, _) =
        send(&router, Method::GET, "/admin/tenants", Some(ACME_KEY), None, None).await;
    let (ok_status, listed) =
        send(&router, Method::GET, "/admin/tenants", Some(ADMIN_TOKEN), None, None).await;

    assert_eq!(without_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(ok_status, StatusCode::OK);
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn suspended_tenants_are_forbidden_until_reactivated() {
    let router = test_router();
    let tenant_id = provision(&router, "acme", ACME_KEY).await;

    let (status, suspended) = send(
        &router,
        Method::POST,
        format!("/admin/tenants/{tenant_id}/suspend").as_str(),
        Some(ADMIN_TOKEN),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(suspended["data"]["status"], "suspended");

    let (forbidden_status, _) =
        send(&router, Method::GET, "/v1/customers", Some(ACME_KEY), None, None).await;
    assert_eq!(forbidden_status, StatusCode::FORBIDDEN);

    send(
        &router,
        Method::POST,
        format!("/admin/tenants/{tenant_id}/reactivate").as_str(),
        Some(ADMIN_TOKEN),
        None,
        None,
    )
    .await;
    let (allowed_status, _) =
        send(&router, Method::GET, "/v1/customers", Some(ACME_KEY), None, None).await;
    assert_eq!(allowed_status, StatusCode::OK);
}

#[tokio::test]
async fn health_reports_disabled_database_in_memory_mode() {
    let router = test_router();

    let (status, body) = send(&router, Method::GET, "/health", None, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"]["status"], "disabled");
}
