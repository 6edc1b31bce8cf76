//! Completion of records left in flight by interrupted requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use paygate_core::{AppError, AppResult, AuthError};
use paygate_domain::RecordState;

use crate::resource_orchestrator::ResourceOrchestrator;
use crate::resource_ports::ResourceRepository;
use crate::tenant_resolver::TenantResolver;

/// Counters describing one reconciliation batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Records picked up by the batch.
    pub examined: usize,
    /// Records that reached `active` or `canceled`.
    pub completed: usize,
    /// Records still awaiting the provider after retries.
    pub still_pending: usize,
    /// Records the provider rejected.
    pub failed: usize,
    /// Records left alone (suspended tenant, concurrent writer).
    pub skipped: usize,
}

/// Drives `pending` and `cancellation_pending` records to a settled state.
#[derive(Clone)]
pub struct ReconciliationService {
    tenant_resolver: TenantResolver,
    resources: Arc<dyn ResourceRepository>,
    orchestrator: ResourceOrchestrator,
}

impl ReconciliationService {
    /// Creates a reconciliation service.
    #[must_use]
    pub fn new(
        tenant_resolver: TenantResolver,
        resources: Arc<dyn ResourceRepository>,
        orchestrator: ResourceOrchestrator,
    ) -> Self {
        Self {
            tenant_resolver,
            resources,
            orchestrator,
        }
    }

    /// Reconciles up to `limit` records untouched for at least `grace`.
    pub async fn reconcile_batch(
        &self,
        limit: usize,
        grace: Duration,
    ) -> AppResult<ReconciliationReport> {
        let grace = chrono::Duration::from_std(grace).map_err(|error| {
            AppError::Validation(format!("invalid reconciliation grace period: {error}"))
        })?;
        let records = self
            .resources
            .list_awaiting_reconciliation(Utc::now() - grace, limit)
            .await?;

        let mut report = ReconciliationReport {
            examined: records.len(),
            ..ReconciliationReport::default()
        };

        for record in records {
            let record_id = record.id();
            let context = match self.tenant_resolver.load_context(record.tenant_id()).await {
                Ok(context) => context,
                Err(AppError::Auth(AuthError::Suspended)) => {
                    debug!(record_id = %record_id, "skipping record of suspended tenant");
                    report.skipped += 1;
                    continue;
                }
                Err(error) => {
                    warn!(record_id = %record_id, error = %error, "failed to load tenant for record");
                    report.skipped += 1;
                    continue;
                }
            };

            let outcome = match record.state() {
                RecordState::Pending => self.orchestrator.complete_create(&context, record).await,
                RecordState::CancellationPending => {
                    self.orchestrator.complete_cancel(&context, record).await
                }
                RecordState::Active | RecordState::Canceled | RecordState::Failed => {
                    report.skipped += 1;
                    continue;
                }
            };

            match outcome {
                Ok(settled) => {
                    debug!(
                        record_id = %record_id,
                        state = settled.state().as_str(),
                        "reconciled record"
                    );
                    report.completed += 1;
                }
                Err(error) if error.is_retryable() => report.still_pending += 1,
                Err(AppError::Conflict(_)) => report.skipped += 1,
                Err(error) => {
                    warn!(record_id = %record_id, error = %error, "reconciliation settled record as failed");
                    report.failed += 1;
                }
            }
        }

        if report.examined > 0 {
            info!(
                examined = report.examined,
                completed = report.completed,
                still_pending = report.still_pending,
                failed = report.failed,
                skipped = report.skipped,
                "reconciliation batch finished"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use paygate_core::ProviderError;
    use paygate_domain::{ProviderCredential, RecordState, ResourceKind};

    use super::{ReconciliationReport, ReconciliationService};
    use crate::resource_orchestrator::CreateCustomerInput;
    use crate::tenant_admin_service::{ProvisionTenantInput, TenantAdminService};
    use crate::test_support::{
        FakeTenantRepository, OrchestratorFixture, ReversingCipher, orchestrator_fixture,
    };
    use crate::tenant_resolver::{TenantContext, TenantResolver};

    struct Harness {
        fixture: OrchestratorFixture,
        admin: TenantAdminService,
        resolver: TenantResolver,
        service: ReconciliationService,
    }

    fn harness() -> Harness {
        let fixture = orchestrator_fixture();
        let tenants = Arc::new(FakeTenantRepository::default());
        let cipher = Arc::new(ReversingCipher);
        let resolver = TenantResolver::new(tenants.clone(), cipher.clone());
        let service = ReconciliationService::new(
            resolver.clone(),
            fixture.resources.clone(),
            fixture.orchestrator.clone(),
        );

        Harness {
            admin: TenantAdminService::new(tenants, cipher),
            resolver,
            service,
            fixture,
        }
    }

    async fn provisioned_context(harness: &Harness) -> TenantContext {
        let provisioned = harness
            .admin
            .provision_tenant(ProvisionTenantInput {
                name: "Acme".to_owned(),
                provider_credential: ProviderCredential::new("sk_test_acme")
                    .unwrap_or_else(|_| unreachable!()),
                api_key: None,
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        harness
            .resolver
            .resolve(Some(provisioned.api_key.expose()))
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    async fn leave_customer_pending(harness: &Harness, context: &TenantContext) {
        harness
            .fixture
            .provider
            .fail_next([
                ProviderError::Transient("timeout".to_owned()),
                ProviderError::Transient("timeout".to_owned()),
                ProviderError::Transient("timeout".to_owned()),
            ])
            .await;
        let _ = harness
            .fixture
            .orchestrator
            .create_customer(
                context,
                Some("req-1"),
                CreateCustomerInput {
                    email: "ada@example.com".to_owned(),
                    display_name: "Ada".to_owned(),
                },
            )
            .await;
    }

    #[tokio::test]
    async fn pending_create_is_completed_with_the_same_idempotency_key() {
        let harness = harness();
        let context = provisioned_context(&harness).await;
        leave_customer_pending(&harness, &context).await;

        let report = harness
            .service
            .reconcile_batch(10, Duration::ZERO)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            report,
            ReconciliationReport {
                examined: 1,
                completed: 1,
                ..ReconciliationReport::default()
            }
        );
        let records = harness.fixture.resources.all().await;
        assert_eq!(records[0].state(), RecordState::Active);
        assert_eq!(harness.fixture.provider.remote_count().await, 1);
    }

    #[tokio::test]
    async fn records_inside_the_grace_period_are_left_alone() {
        let harness = harness();
        let context = provisioned_context(&harness).await;
        leave_customer_pending(&harness, &context).await;

        let report = harness
            .service
            .reconcile_batch(10, Duration::from_secs(3600))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(report.examined, 0);
        assert_eq!(
            harness.fixture.resources.all().await[0].state(),
            RecordState::Pending
        );
    }

    #[tokio::test]
    async fn suspended_tenants_are_skipped() {
        let harness = harness();
        let context = provisioned_context(&harness).await;
        leave_customer_pending(&harness, &context).await;
        let _ = harness.admin.suspend_tenant(context.tenant_id()).await;

        let report = harness
            .service
            .reconcile_batch(10, Duration::ZERO)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(report.examined, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.completed, 0);
    }

    #[tokio::test]
    async fn unconfirmed_cancel_is_completed() {
        let harness = harness();
        let context = provisioned_context(&harness).await;
        let customer = harness
            .fixture
            .orchestrator
            .create_customer(
                &context,
                None,
                CreateCustomerInput {
                    email: "ada@example.com".to_owned(),
                    display_name: "Ada".to_owned(),
                },
            )
            .await
            .unwrap_or_else(|_| unreachable!())
            .record;
        harness
            .fixture
            .provider
            .fail_next([
                ProviderError::Transient("timeout".to_owned()),
                ProviderError::Transient("timeout".to_owned()),
                ProviderError::Transient("timeout".to_owned()),
            ])
            .await;
        let _ = harness
            .fixture
            .orchestrator
            .cancel(&context, ResourceKind::Customer, customer.id())
            .await;

        let report = harness
            .service
            .reconcile_batch(10, Duration::ZERO)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(report.completed, 1);
        let stored = harness
            .fixture
            .orchestrator
            .get(&context, ResourceKind::Customer, customer.id())
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(stored.state(), RecordState::Canceled);
    }

    #[tokio::test]
    async fn still_failing_provider_keeps_record_pending() {
        let harness = harness();
        let context = provisioned_context(&harness).await;
        leave_customer_pending(&harness, &context).await;
        harness
            .fixture
            .provider
            .fail_next([
                ProviderError::Transient("timeout".to_owned()),
                ProviderError::Transient("timeout".to_owned()),
                ProviderError::Transient("timeout".to_owned()),
            ])
            .await;

        let report = harness
            .service
            .reconcile_batch(10, Duration::ZERO)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(report.still_pending, 1);
        assert_eq!(
            harness.fixture.resources.all().await[0].state(),
            RecordState::Pending
        );
    }
}
