use paygate_core::AppResult;
use paygate_domain::{
    RecordId, ResourceAttributes, ResourceKind, ResourceRecord, SetupIntentAttributes,
    SetupIntentUsage,
};

use crate::tenant_resolver::TenantContext;

use super::lifecycle::referenceable;
use super::{CreateOutcome, ResourceOrchestrator};

/// Input for creating a setup intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSetupIntentInput {
    /// Local customer record the payment method is saved for.
    pub customer_id: RecordId,
    /// Intended usage; defaults to off-session.
    pub usage: Option<SetupIntentUsage>,
}

impl ResourceOrchestrator {
    /// Creates a setup intent for an active customer of the calling tenant.
    pub async fn create_setup_intent(
        &self,
        context: &TenantContext,
        natural_key: Option<&str>,
        input: CreateSetupIntentInput,
    ) -> AppResult<CreateOutcome> {
        let customer = self
            .owned_parent(context, ResourceKind::Customer, input.customer_id)
            .await?;

        let attributes = SetupIntentAttributes::requested(
            input.customer_id,
            input.usage.unwrap_or(SetupIntentUsage::OffSession),
        );
        self.create_resource(
            context,
            natural_key,
            ResourceAttributes::SetupIntent(attributes),
            referenceable(&customer),
        )
        .await
    }

    /// Refreshes a setup intent's status from the provider.
    pub async fn sync_setup_intent(
        &self,
        context: &TenantContext,
        id: RecordId,
    ) -> AppResult<ResourceRecord> {
        self.sync_resource(context, ResourceKind::SetupIntent, id)
            .await
    }
}
