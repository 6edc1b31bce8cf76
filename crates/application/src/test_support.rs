//! In-test fakes for the application ports.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Semaphore};

use paygate_core::{AppError, AppResult, ProviderError, ProviderResult, TenantId};
use paygate_domain::{
    ProviderCredential, RecordId, ResourceKind, ResourceRecord, SetupIntentStatus,
    SubscriptionStatus, Tenant, TenantStatus,
};

use crate::provider_call::{ProviderCaller, RetryPolicy};
use crate::provider_ports::{PaymentProvider, ProviderObject, ProviderRequest, ProviderUpdate};
use crate::resource_orchestrator::ResourceOrchestrator;
use crate::resource_ports::{AllocationOutcome, ResourceListQuery, ResourceRepository};
use crate::tenant_ports::{CredentialCipher, StoredTenant, TenantRepository};
use crate::tenant_resolver::TenantContext;

#[derive(Default)]
pub(crate) struct FakeTenantRepository {
    tenants: Mutex<Vec<StoredTenant>>,
}

#[async_trait]
impl TenantRepository for FakeTenantRepository {
    async fn find_by_api_key_digest(
        &self,
        api_key_digest: &str,
    ) -> AppResult<Option<StoredTenant>> {
        Ok(self
            .tenants
            .lock()
            .await
            .iter()
            .find(|stored| stored.api_key_digest == api_key_digest)
            .cloned())
    }

    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<StoredTenant>> {
        Ok(self
            .tenants
            .lock()
            .await
            .iter()
            .find(|stored| stored.tenant.id() == tenant_id)
            .cloned())
    }

    async fn create_tenant(&self, tenant: StoredTenant) -> AppResult<()> {
        let mut tenants = self.tenants.lock().await;
        if tenants
            .iter()
            .any(|stored| stored.api_key_digest == tenant.api_key_digest)
        {
            return Err(AppError::Conflict("api key already in use".to_owned()));
        }

        tenants.push(tenant);
        Ok(())
    }

    async fn update_status(&self, tenant_id: TenantId, status: TenantStatus) -> AppResult<Tenant> {
        let mut tenants = self.tenants.lock().await;
        let stored = tenants
            .iter_mut()
            .find(|stored| stored.tenant.id() == tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;

        stored.tenant = stored.tenant.with_status(status);
        Ok(stored.tenant.clone())
    }

    async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        Ok(self
            .tenants
            .lock()
            .await
            .iter()
            .map(|stored| stored.tenant.clone())
            .collect())
    }
}

/// Reversible stand-in for real encryption.
pub(crate) struct ReversingCipher;

impl CredentialCipher for ReversingCipher {
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        Ok(plaintext.iter().rev().copied().collect())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        Ok(ciphertext.iter().rev().copied().collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeResourceRepository {
    records: Mutex<Vec<ResourceRecord>>,
}

impl FakeResourceRepository {
    pub(crate) async fn all(&self) -> Vec<ResourceRecord> {
        self.records.lock().await.clone()
    }

    pub(crate) async fn insert(&self, record: ResourceRecord) {
        self.records.lock().await.push(record);
    }
}

#[async_trait]
impl ResourceRepository for FakeResourceRepository {
    async fn allocate(&self, record: ResourceRecord) -> AppResult<AllocationOutcome> {
        let mut records = self.records.lock().await;
        if let Some(existing) = records.iter().find(|stored| {
            stored.tenant_id() == record.tenant_id()
                && stored.kind() == record.kind()
                && stored.natural_key() == record.natural_key()
        }) {
            return Ok(AllocationOutcome::Existing(existing.clone()));
        }

        records.push(record.clone());
        Ok(AllocationOutcome::Created(record))
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|stored| stored.tenant_id() == tenant_id && stored.kind() == kind && stored.id() == id)
            .cloned())
    }

    async fn find_by_natural_key(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        natural_key: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|stored| {
                stored.tenant_id() == tenant_id
                    && stored.kind() == kind
                    && stored.natural_key() == natural_key
            })
            .cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        kind: ResourceKind,
        query: ResourceListQuery,
    ) -> AppResult<Vec<ResourceRecord>> {
        let records = self.records.lock().await;
        let mut matching: Vec<ResourceRecord> = records
            .iter()
            .filter(|stored| stored.tenant_id() == tenant_id && stored.kind() == kind)
            .filter(|stored| {
                query
                    .parent_id
                    .is_none_or(|parent| stored.attributes().parent_id() == Some(parent))
            })
            .cloned()
            .collect();
        matching.sort_by_key(|stored| std::cmp::Reverse(stored.created_at()));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn compare_and_set(
        &self,
        current: &ResourceRecord,
        next: &ResourceRecord,
    ) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let stored = records
            .iter_mut()
            .find(|stored| stored.id() == current.id() && stored.tenant_id() == current.tenant_id())
            .ok_or_else(|| AppError::NotFound("record does not exist".to_owned()))?;

        if stored.state() != current.state() || stored.version() != current.version() {
            return Err(AppError::Conflict("record was modified concurrently".to_owned()));
        }

        *stored = next.clone();
        Ok(())
    }

    async fn list_awaiting_reconciliation(
        &self,
        updated_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<ResourceRecord>> {
        let records = self.records.lock().await;
        let mut matching: Vec<ResourceRecord> = records
            .iter()
            .filter(|stored| stored.state().awaits_reconciliation())
            .filter(|stored| stored.updated_at() <= updated_before)
            .cloned()
            .collect();
        matching.sort_by_key(ResourceRecord::updated_at);
        matching.truncate(limit);
        Ok(matching)
    }
}

#[derive(Default)]
struct ScriptState {
    failures: VecDeque<ProviderError>,
    by_idempotency_key: HashMap<String, ProviderObject>,
    objects: HashMap<String, ProviderObject>,
    subscriptions_by_customer: HashMap<String, Vec<String>>,
    calls: Vec<(String, String)>,
    next_id: u32,
}

/// Provider fake with scripted failures and idempotent creates.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    state: Mutex<ScriptState>,
    create_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedProvider {
    /// Blocks remote creates until permits are added to the returned gate.
    pub(crate) async fn hold_creates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.create_gate.lock().await = Some(gate.clone());
        gate
    }

    pub(crate) async fn fail_next(&self, errors: impl IntoIterator<Item = ProviderError>) {
        self.state.lock().await.failures.extend(errors);
    }

    /// Number of distinct remote objects created.
    pub(crate) async fn remote_count(&self) -> usize {
        self.state.lock().await.by_idempotency_key.len()
    }

    /// `(operation, credential)` pairs in call order.
    pub(crate) async fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().await.calls.clone()
    }

    pub(crate) async fn replace_remote(&self, object: ProviderObject) {
        self.state
            .lock()
            .await
            .objects
            .insert(object.id().to_owned(), object);
    }

    async fn begin(&self, operation: &str, credential: &ProviderCredential) -> ProviderResult<()> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push((operation.to_owned(), credential.expose().to_owned()));
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn create(
        &self,
        credential: &ProviderCredential,
        request: &ProviderRequest,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        self.begin("create", credential).await?;
        let gate = self.create_gate.lock().await.clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        let mut state = self.state.lock().await;
        if let Some(existing) = state.by_idempotency_key.get(idempotency_key) {
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let sequence = state.next_id;
        let object = match request {
            ProviderRequest::Customer { .. } => ProviderObject::Customer {
                id: format!("cus_{sequence}"),
            },
            ProviderRequest::Subscription { .. } => ProviderObject::Subscription {
                id: format!("sub_{sequence}"),
                status: SubscriptionStatus::Active,
                cancel_at_period_end: false,
            },
            ProviderRequest::SubscriptionItem { quantity, .. } => {
                ProviderObject::SubscriptionItem {
                    id: format!("si_{sequence}"),
                    quantity: *quantity,
                }
            }
            ProviderRequest::SetupIntent { .. } => ProviderObject::SetupIntent {
                id: format!("seti_{sequence}"),
                status: SetupIntentStatus::RequiresPaymentMethod,
                client_secret: Some(format!("seti_{sequence}_secret")),
            },
            ProviderRequest::TaxRate { .. } => ProviderObject::TaxRate {
                id: format!("txr_{sequence}"),
                active: true,
            },
        };

        if let ProviderRequest::Subscription { customer, .. } = request {
            state
                .subscriptions_by_customer
                .entry(customer.clone())
                .or_default()
                .push(object.id().to_owned());
        }
        state
            .by_idempotency_key
            .insert(idempotency_key.to_owned(), object.clone());
        state.objects.insert(object.id().to_owned(), object.clone());
        Ok(object)
    }

    async fn retrieve(
        &self,
        credential: &ProviderCredential,
        _kind: ResourceKind,
        provider_id: &str,
    ) -> ProviderResult<ProviderObject> {
        self.begin("retrieve", credential).await?;
        self.state
            .lock()
            .await
            .objects
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ProviderError::InvalidRequest(format!("No such object: {provider_id}")))
    }

    async fn update(
        &self,
        credential: &ProviderCredential,
        provider_id: &str,
        update: &ProviderUpdate,
        _idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        self.begin("update", credential).await?;
        let mut state = self.state.lock().await;
        let current = state
            .objects
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ProviderError::InvalidRequest(format!("No such object: {provider_id}")))?;

        let updated = match (current, update) {
            (
                ProviderObject::Subscription { id, status, .. },
                ProviderUpdate::Subscription {
                    cancel_at_period_end,
                },
            ) => ProviderObject::Subscription {
                id,
                status,
                cancel_at_period_end: *cancel_at_period_end,
            },
            (ProviderObject::SubscriptionItem { id, .. }, ProviderUpdate::SubscriptionItem { quantity }) => {
                ProviderObject::SubscriptionItem {
                    id,
                    quantity: *quantity,
                }
            }
            (ProviderObject::TaxRate { id, .. }, ProviderUpdate::TaxRate { active, .. }) => {
                ProviderObject::TaxRate {
                    id,
                    active: *active,
                }
            }
            (current @ ProviderObject::Customer { .. }, ProviderUpdate::Customer { .. }) => current,
            _ => {
                return Err(ProviderError::InvalidRequest(
                    "update does not match object".to_owned(),
                ));
            }
        };

        state.objects.insert(provider_id.to_owned(), updated.clone());
        Ok(updated)
    }

    async fn cancel(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
        _idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        self.begin("cancel", credential).await?;
        let mut state = self.state.lock().await;
        let current = state
            .objects
            .get(provider_id)
            .cloned()
            .ok_or_else(|| ProviderError::InvalidRequest(format!("No such object: {provider_id}")))?;

        let canceled = match current {
            ProviderObject::Subscription { id, .. } => ProviderObject::Subscription {
                id,
                status: SubscriptionStatus::Canceled,
                cancel_at_period_end: false,
            },
            ProviderObject::SetupIntent { id, client_secret, .. } => ProviderObject::SetupIntent {
                id,
                status: SetupIntentStatus::Canceled,
                client_secret,
            },
            ProviderObject::TaxRate { id, .. } => ProviderObject::TaxRate { id, active: false },
            other => ProviderObject::Deleted {
                kind,
                id: other.id().to_owned(),
            },
        };

        if kind == ResourceKind::Customer {
            let subscriptions = state
                .subscriptions_by_customer
                .get(provider_id)
                .cloned()
                .unwrap_or_default();
            for id in subscriptions {
                state.objects.insert(
                    id.clone(),
                    ProviderObject::Subscription {
                        id,
                        status: SubscriptionStatus::Canceled,
                        cancel_at_period_end: false,
                    },
                );
            }
        }
        state.objects.insert(provider_id.to_owned(), canceled.clone());
        Ok(canceled)
    }
}

pub(crate) fn tenant_context(credential: &str) -> TenantContext {
    TenantContext::new(
        TenantId::new(),
        "Acme".to_owned(),
        ProviderCredential::new(credential).unwrap_or_else(|_| unreachable!()),
    )
}

pub(crate) struct OrchestratorFixture {
    pub(crate) orchestrator: ResourceOrchestrator,
    pub(crate) resources: Arc<FakeResourceRepository>,
    pub(crate) provider: Arc<ScriptedProvider>,
}

pub(crate) fn orchestrator_fixture() -> OrchestratorFixture {
    let resources = Arc::new(FakeResourceRepository::default());
    let provider = Arc::new(ScriptedProvider::default());
    let caller = ProviderCaller::new(
        provider.clone(),
        RetryPolicy::immediate(3),
        Duration::from_secs(5),
    );

    OrchestratorFixture {
        orchestrator: ResourceOrchestrator::new(resources.clone(), caller),
        resources,
        provider,
    }
}
