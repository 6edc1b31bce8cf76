use paygate_core::{AppError, AppResult};
use paygate_domain::{
    RecordId, ResourceAttributes, ResourceKind, ResourceRecord, SubscriptionItemAttributes,
    parse_quantity,
};

use crate::provider_ports::ProviderUpdate;
use crate::tenant_resolver::TenantContext;

use super::lifecycle::referenceable;
use super::{CreateOutcome, ResourceOrchestrator};

/// Input for adding an item to a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionItemInput {
    /// Local subscription record the item belongs to.
    pub subscription_id: RecordId,
    /// Provider price id.
    pub price_reference: String,
    /// Item quantity.
    pub quantity: i64,
}

/// Input for changing an item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSubscriptionItemInput {
    /// New quantity.
    pub quantity: i64,
}

impl ResourceOrchestrator {
    /// Adds an item to a non-canceled subscription of the calling tenant.
    pub async fn create_subscription_item(
        &self,
        context: &TenantContext,
        natural_key: Option<&str>,
        input: CreateSubscriptionItemInput,
    ) -> AppResult<CreateOutcome> {
        let attributes = SubscriptionItemAttributes::new(
            input.subscription_id,
            input.price_reference,
            input.quantity,
        )?;

        let subscription = self
            .owned_parent(context, ResourceKind::Subscription, input.subscription_id)
            .await?;

        self.create_resource(
            context,
            natural_key,
            ResourceAttributes::SubscriptionItem(attributes),
            referenceable(&subscription).and_then(|()| not_ended(&subscription)),
        )
        .await
    }

    /// Changes the quantity of a subscription item.
    pub async fn update_subscription_item(
        &self,
        context: &TenantContext,
        id: RecordId,
        input: UpdateSubscriptionItemInput,
    ) -> AppResult<ResourceRecord> {
        let quantity = parse_quantity(input.quantity)?;

        self.update_resource(context, ResourceKind::SubscriptionItem, id, |attributes| {
            let ResourceAttributes::SubscriptionItem(current) = attributes else {
                return Err(AppError::Internal(
                    "record is not a subscription item".to_owned(),
                ));
            };

            Ok((
                ResourceAttributes::SubscriptionItem(current.with_quantity(quantity)),
                ProviderUpdate::SubscriptionItem { quantity },
            ))
        })
        .await
    }
}

fn not_ended(subscription: &ResourceRecord) -> AppResult<()> {
    match subscription.attributes() {
        ResourceAttributes::Subscription(parent) if parent.status().is_ended() => {
            Err(AppError::Validation(format!(
                "subscription '{}' has ended at the provider",
                subscription.id()
            )))
        }
        _ => Ok(()),
    }
}
