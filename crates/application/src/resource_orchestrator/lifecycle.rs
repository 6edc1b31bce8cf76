use std::fmt::Write;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use paygate_core::{AppError, AppResult, ProviderResult};
use paygate_domain::{
    NewResourceRecord, RecordId, RecordState, ResourceAttributes, ResourceKind, ResourceRecord,
};

use crate::provider_ports::{ProviderObject, ProviderRequest, ProviderUpdate};
use crate::resource_ports::{AllocationOutcome, MAX_LIST_LIMIT, ResourceListQuery};
use crate::tenant_resolver::TenantContext;

use super::remote_state::{canceled_attributes, merge_remote, remote_has_ended};
use super::{CreateDisposition, CreateOutcome, ResourceOrchestrator};

/// SHA-256 hex digest of the canonical create payload.
pub(super) fn request_fingerprint(attributes: &ResourceAttributes) -> AppResult<String> {
    let canonical = serde_json::to_vec(attributes).map_err(|error| {
        AppError::Internal(format!("failed to serialize create payload: {error}"))
    })?;

    Ok(Sha256::digest(canonical)
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        }))
}

impl ResourceOrchestrator {
    /// Returns one record owned by the calling tenant.
    pub async fn get(
        &self,
        context: &TenantContext,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<ResourceRecord> {
        self.resources
            .find(context.tenant_id(), kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} '{id}' was not found", kind.label())))
    }

    /// Lists records of one kind owned by the calling tenant.
    pub async fn list(
        &self,
        context: &TenantContext,
        kind: ResourceKind,
        query: ResourceListQuery,
    ) -> AppResult<Vec<ResourceRecord>> {
        self.resources
            .list(context.tenant_id(), kind, query)
            .await
    }

    /// Cancels, deletes or deactivates the remote object, then the record.
    ///
    /// Canceling a canceled record returns it unchanged.
    pub async fn cancel(
        &self,
        context: &TenantContext,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<ResourceRecord> {
        let record = self.get(context, kind, id).await?;

        match record.state() {
            RecordState::Canceled => Ok(record),
            RecordState::Pending | RecordState::Failed => Err(AppError::Validation(format!(
                "{} '{id}' is {} and cannot be canceled",
                kind.label(),
                record.state().as_str()
            ))),
            RecordState::Active | RecordState::CancellationPending => {
                self.complete_cancel(context, record).await
            }
        }
    }

    /// Allocates a pending record for `attributes` and creates it remotely,
    /// or answers with the record already holding the same natural key.
    ///
    /// `admission` is only enforced for new records, so replaying a settled
    /// create still answers after its parent was canceled.
    pub(super) async fn create_resource(
        &self,
        context: &TenantContext,
        natural_key: Option<&str>,
        attributes: ResourceAttributes,
        admission: AppResult<()>,
    ) -> AppResult<CreateOutcome> {
        let kind = attributes.kind();
        let request_fingerprint = request_fingerprint(&attributes)?;

        if let Some(natural_key) = natural_key
            && let Some(existing) = self
                .resources
                .find_by_natural_key(context.tenant_id(), kind, natural_key)
                .await?
        {
            return replay(context, existing, request_fingerprint.as_str());
        }
        admission?;

        let natural_key = natural_key
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let pending = ResourceRecord::pending(
            NewResourceRecord {
                tenant_id: context.tenant_id(),
                natural_key,
                request_fingerprint: request_fingerprint.clone(),
                attributes,
            },
            Utc::now(),
        )?;

        match self.resources.allocate(pending).await? {
            AllocationOutcome::Existing(existing) => {
                replay(context, existing, request_fingerprint.as_str())
            }
            AllocationOutcome::Created(record) => {
                let record = self.complete_create(context, record).await?;
                Ok(CreateOutcome {
                    record,
                    disposition: CreateDisposition::Created,
                })
            }
        }
    }

    /// Issues the remote create for a pending record and settles the outcome.
    ///
    /// Safe to repeat: the idempotency key is derived from the record id.
    pub(crate) async fn complete_create(
        &self,
        context: &TenantContext,
        record: ResourceRecord,
    ) -> AppResult<ResourceRecord> {
        let request = match self.provider_request(context, record.attributes()).await {
            Ok(request) => request,
            Err(AppError::Validation(detail)) => {
                let failed = record.fail(detail.as_str(), Utc::now())?;
                self.resources.compare_and_set(&record, &failed).await?;
                return Err(AppError::Validation(detail));
            }
            Err(error) => return Err(error),
        };

        let idempotency_key = record.create_idempotency_key();
        let (provider, credential, request, key) = (
            self.caller.provider(),
            context.credential(),
            &request,
            idempotency_key.as_str(),
        );
        let result = self
            .caller
            .call("create", move || provider.create(credential, request, key))
            .await;

        self.settle_create(context, record, result).await
    }

    async fn settle_create(
        &self,
        context: &TenantContext,
        record: ResourceRecord,
        result: ProviderResult<ProviderObject>,
    ) -> AppResult<ResourceRecord> {
        let now = Utc::now();

        match result {
            Ok(object) => {
                let attributes = merge_remote(record.attributes(), &object)?;
                let active = record.activate(object.id(), attributes, now)?;
                self.resources.compare_and_set(&record, &active).await?;
                info!(
                    tenant_id = %context.tenant_id(),
                    record_id = %active.id(),
                    kind = active.kind().as_str(),
                    provider_id = object.id(),
                    "created remote object"
                );
                Ok(active)
            }
            Err(error) if error.is_retryable() => {
                let detail = error.to_string();
                let noted = record.note_error(detail.as_str(), now);
                self.store_best_effort(&record, &noted).await;
                warn!(
                    tenant_id = %context.tenant_id(),
                    record_id = %record.id(),
                    kind = record.kind().as_str(),
                    error = %error,
                    "remote create left pending"
                );
                Err(error.into())
            }
            Err(error) => {
                let detail = error.to_string();
                let failed = record.fail(detail.as_str(), now)?;
                self.resources.compare_and_set(&record, &failed).await?;
                warn!(
                    tenant_id = %context.tenant_id(),
                    record_id = %record.id(),
                    kind = record.kind().as_str(),
                    error = %error,
                    "remote create rejected"
                );
                Err(error.into())
            }
        }
    }

    /// Issues the remote cancel for an active or cancellation-pending record.
    pub(crate) async fn complete_cancel(
        &self,
        context: &TenantContext,
        record: ResourceRecord,
    ) -> AppResult<ResourceRecord> {
        let provider_id = remote_id(&record)?;
        let idempotency_key = record.cancel_idempotency_key();
        let kind = record.kind();
        let (provider, credential, remote, key) = (
            self.caller.provider(),
            context.credential(),
            provider_id.as_str(),
            idempotency_key.as_str(),
        );
        let result = self
            .caller
            .call("cancel", move || provider.cancel(credential, kind, remote, key))
            .await;

        let canceled = self.settle_cancel(context, record, result).await?;
        if kind == ResourceKind::Customer {
            self.refresh_subscriptions_of(context, canceled.id()).await;
        }
        Ok(canceled)
    }

    /// Pulls the remote state of a deleted customer's live subscriptions,
    /// which the provider cancels along with the customer.
    ///
    /// Failures are logged; affected subscriptions catch up on their next sync.
    async fn refresh_subscriptions_of(&self, context: &TenantContext, customer_id: RecordId) {
        let mut offset = 0;
        loop {
            let query = ResourceListQuery {
                limit: MAX_LIST_LIMIT,
                offset,
                parent_id: Some(customer_id),
            };
            let page = match self.list(context, ResourceKind::Subscription, query).await {
                Ok(page) => page,
                Err(error) => {
                    warn!(
                        tenant_id = %context.tenant_id(),
                        customer_id = %customer_id,
                        error = %error,
                        "failed to list subscriptions of deleted customer"
                    );
                    return;
                }
            };

            for subscription in page
                .iter()
                .filter(|subscription| subscription.state() == RecordState::Active)
            {
                if let Err(error) = self
                    .sync_resource(context, ResourceKind::Subscription, subscription.id())
                    .await
                {
                    warn!(
                        tenant_id = %context.tenant_id(),
                        record_id = %subscription.id(),
                        error = %error,
                        "failed to refresh subscription of deleted customer"
                    );
                }
            }

            if page.len() < MAX_LIST_LIMIT {
                return;
            }
            offset += MAX_LIST_LIMIT;
        }
    }

    async fn settle_cancel(
        &self,
        context: &TenantContext,
        record: ResourceRecord,
        result: ProviderResult<ProviderObject>,
    ) -> AppResult<ResourceRecord> {
        let now = Utc::now();

        match result {
            Ok(object) => {
                let attributes = canceled_attributes(record.attributes(), &object)?;
                let canceled = record.cancel(attributes, now)?;
                self.resources.compare_and_set(&record, &canceled).await?;
                info!(
                    tenant_id = %context.tenant_id(),
                    record_id = %canceled.id(),
                    kind = canceled.kind().as_str(),
                    "canceled remote object"
                );
                Ok(canceled)
            }
            Err(error) if error.is_retryable() => {
                let detail = error.to_string();
                let flagged = record.flag_cancellation_pending(detail.as_str(), now)?;
                self.resources.compare_and_set(&record, &flagged).await?;
                warn!(
                    tenant_id = %context.tenant_id(),
                    record_id = %record.id(),
                    kind = record.kind().as_str(),
                    error = %error,
                    "remote cancel unconfirmed"
                );
                Err(error.into())
            }
            Err(error) => {
                let detail = error.to_string();
                let next = if record.state() == RecordState::CancellationPending {
                    record.revert_cancellation(detail.as_str(), now)?
                } else {
                    record.note_error(detail.as_str(), now)
                };
                self.resources.compare_and_set(&record, &next).await?;
                warn!(
                    tenant_id = %context.tenant_id(),
                    record_id = %record.id(),
                    kind = record.kind().as_str(),
                    error = %error,
                    "remote cancel rejected"
                );
                Err(error.into())
            }
        }
    }

    /// Sends an update to the provider and stores the confirmed attributes.
    ///
    /// `build` derives the new local attributes and the provider update from
    /// the current attributes.
    pub(super) async fn update_resource<F>(
        &self,
        context: &TenantContext,
        kind: ResourceKind,
        id: RecordId,
        build: F,
    ) -> AppResult<ResourceRecord>
    where
        F: FnOnce(&ResourceAttributes) -> AppResult<(ResourceAttributes, ProviderUpdate)>,
    {
        let record = self.get(context, kind, id).await?;
        if record.state() != RecordState::Active {
            return Err(AppError::Validation(format!(
                "{} '{id}' is {} and cannot be updated",
                kind.label(),
                record.state().as_str()
            )));
        }

        let provider_id = remote_id(&record)?;
        let (attributes, update) = build(record.attributes())?;
        if attributes == *record.attributes() {
            return Ok(record);
        }

        let idempotency_key = record.update_idempotency_key();
        let (provider, credential, remote, update, key) = (
            self.caller.provider(),
            context.credential(),
            provider_id.as_str(),
            &update,
            idempotency_key.as_str(),
        );
        let object = self
            .caller
            .call("update", move || provider.update(credential, remote, update, key))
            .await?;

        let merged = merge_remote(&attributes, &object)?;
        let updated = record.apply_update(merged, Utc::now())?;
        self.resources.compare_and_set(&record, &updated).await?;
        info!(
            tenant_id = %context.tenant_id(),
            record_id = %updated.id(),
            kind = kind.as_str(),
            version = updated.version(),
            "updated remote object"
        );
        Ok(updated)
    }

    /// Refreshes a record from the provider.
    ///
    /// Pending records resume their remote create; terminal records are
    /// returned unchanged.
    pub(super) async fn sync_resource(
        &self,
        context: &TenantContext,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<ResourceRecord> {
        let record = self.get(context, kind, id).await?;

        match record.state() {
            RecordState::Pending => return self.complete_create(context, record).await,
            RecordState::Canceled | RecordState::Failed => return Ok(record),
            RecordState::Active | RecordState::CancellationPending => {}
        }

        let provider_id = remote_id(&record)?;
        let (provider, credential, remote) = (
            self.caller.provider(),
            context.credential(),
            provider_id.as_str(),
        );
        let object = self
            .caller
            .call("retrieve", move || provider.retrieve(credential, kind, remote))
            .await?;

        let now = Utc::now();
        let next = if remote_has_ended(&object) {
            record.cancel(canceled_attributes(record.attributes(), &object)?, now)?
        } else {
            let merged = merge_remote(record.attributes(), &object)?;
            if merged == *record.attributes() {
                return Ok(record);
            }
            record.apply_update(merged, now)?
        };

        self.resources.compare_and_set(&record, &next).await?;
        info!(
            tenant_id = %context.tenant_id(),
            record_id = %next.id(),
            kind = kind.as_str(),
            state = next.state().as_str(),
            "synchronized record with provider"
        );
        Ok(next)
    }

    /// Loads a parent record of the calling tenant referenced by a create.
    pub(super) async fn owned_parent(
        &self,
        context: &TenantContext,
        kind: ResourceKind,
        id: RecordId,
    ) -> AppResult<ResourceRecord> {
        self.resources
            .find(context.tenant_id(), kind, id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("{} '{id}' does not exist", kind.label())))
    }

    /// Builds the provider create request for a record's attributes,
    /// resolving parent records to their remote ids.
    async fn provider_request(
        &self,
        context: &TenantContext,
        attributes: &ResourceAttributes,
    ) -> AppResult<ProviderRequest> {
        let parent_provider_id = match attributes.parent_id() {
            Some(parent_id) => {
                let parent_kind = match attributes {
                    ResourceAttributes::SubscriptionItem(_) => ResourceKind::Subscription,
                    _ => ResourceKind::Customer,
                };
                let parent = self
                    .resources
                    .find(context.tenant_id(), parent_kind, parent_id)
                    .await?;
                let remote = parent
                    .as_ref()
                    .and_then(ResourceRecord::provider_id)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "{} '{parent_id}' has no provider object",
                            parent_kind.label()
                        ))
                    })?;
                Some(remote)
            }
            None => None,
        };
        let parent = || {
            parent_provider_id.clone().ok_or_else(|| {
                AppError::Internal("parent provider id was not resolved".to_owned())
            })
        };

        Ok(match attributes {
            ResourceAttributes::Customer(customer) => ProviderRequest::Customer {
                email: customer.email().as_str().to_owned(),
                name: customer.display_name().as_str().to_owned(),
            },
            ResourceAttributes::Subscription(subscription) => ProviderRequest::Subscription {
                customer: parent()?,
                price: subscription.price_reference().as_str().to_owned(),
                quantity: subscription.quantity(),
            },
            ResourceAttributes::SubscriptionItem(item) => ProviderRequest::SubscriptionItem {
                subscription: parent()?,
                price: item.price_reference().as_str().to_owned(),
                quantity: item.quantity(),
            },
            ResourceAttributes::SetupIntent(intent) => ProviderRequest::SetupIntent {
                customer: parent()?,
                usage: intent.usage(),
            },
            ResourceAttributes::TaxRate(rate) => ProviderRequest::TaxRate {
                display_name: rate.display_name().as_str().to_owned(),
                percentage: rate.percentage(),
                inclusive: rate.inclusive(),
                jurisdiction: rate.jurisdiction().map(str::to_owned),
            },
        })
    }

    async fn store_best_effort(&self, current: &ResourceRecord, next: &ResourceRecord) {
        if let Err(error) = self.resources.compare_and_set(current, next).await {
            warn!(
                record_id = %current.id(),
                error = %error,
                "failed to record provider error on pending record"
            );
        }
    }
}

/// Requires a parent record to be active before a child is created.
pub(super) fn referenceable(parent: &ResourceRecord) -> AppResult<()> {
    if parent.state() != RecordState::Active {
        return Err(AppError::Validation(format!(
            "{} '{}' is {} and cannot be referenced",
            parent.kind().label(),
            parent.id(),
            parent.state().as_str()
        )));
    }

    Ok(())
}

/// Answers a duplicate create with the record holding its natural key.
fn replay(
    context: &TenantContext,
    existing: ResourceRecord,
    request_fingerprint: &str,
) -> AppResult<CreateOutcome> {
    let kind = existing.kind();
    if existing.request_fingerprint() != request_fingerprint {
        return Err(AppError::Conflict(format!(
            "idempotency key '{}' was already used with a different {} payload",
            existing.natural_key(),
            kind.label()
        )));
    }

    let disposition = if existing.state() == RecordState::Pending {
        CreateDisposition::InFlight
    } else {
        CreateDisposition::Replayed
    };
    info!(
        tenant_id = %context.tenant_id(),
        record_id = %existing.id(),
        kind = kind.as_str(),
        state = existing.state().as_str(),
        "answered duplicate create with existing record"
    );

    Ok(CreateOutcome {
        record: existing,
        disposition,
    })
}

fn remote_id(record: &ResourceRecord) -> AppResult<String> {
    record.provider_id().map(str::to_owned).ok_or_else(|| {
        AppError::Internal(format!(
            "{} '{}' has no provider object",
            record.kind().label(),
            record.id()
        ))
    })
}
