use paygate_core::{AppError, AppResult};
use paygate_domain::{
    RecordId, ResourceAttributes, ResourceKind, ResourceRecord, SubscriptionAttributes,
};

use crate::provider_ports::ProviderUpdate;
use crate::tenant_resolver::TenantContext;

use super::lifecycle::referenceable;
use super::{CreateOutcome, ResourceOrchestrator};

/// Input for creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionInput {
    /// Local customer record the subscription bills.
    pub customer_id: RecordId,
    /// Provider price id.
    pub price_reference: String,
    /// Plan quantity; defaults to 1.
    pub quantity: Option<i64>,
}

/// Input for updating a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSubscriptionInput {
    /// Whether the subscription ends at the current period end.
    pub cancel_at_period_end: bool,
}

impl ResourceOrchestrator {
    /// Creates a subscription for an active customer of the calling tenant.
    pub async fn create_subscription(
        &self,
        context: &TenantContext,
        natural_key: Option<&str>,
        input: CreateSubscriptionInput,
    ) -> AppResult<CreateOutcome> {
        let attributes = SubscriptionAttributes::requested(
            input.customer_id,
            input.price_reference,
            input.quantity.unwrap_or(1),
        )?;
        let customer = self
            .owned_parent(context, ResourceKind::Customer, input.customer_id)
            .await?;

        self.create_resource(
            context,
            natural_key,
            ResourceAttributes::Subscription(attributes),
            referenceable(&customer),
        )
        .await
    }

    /// Sets or clears cancellation at period end.
    pub async fn update_subscription(
        &self,
        context: &TenantContext,
        id: RecordId,
        input: UpdateSubscriptionInput,
    ) -> AppResult<ResourceRecord> {
        self.update_resource(context, ResourceKind::Subscription, id, |attributes| {
            let ResourceAttributes::Subscription(current) = attributes else {
                return Err(AppError::Internal("record is not a subscription".to_owned()));
            };

            let changed =
                current.with_provider_state(current.status().clone(), input.cancel_at_period_end);
            let update = ProviderUpdate::Subscription {
                cancel_at_period_end: input.cancel_at_period_end,
            };
            Ok((ResourceAttributes::Subscription(changed), update))
        })
        .await
    }

    /// Refreshes a subscription's status from the provider.
    pub async fn sync_subscription(
        &self,
        context: &TenantContext,
        id: RecordId,
    ) -> AppResult<ResourceRecord> {
        self.sync_resource(context, ResourceKind::Subscription, id)
            .await
    }
}
