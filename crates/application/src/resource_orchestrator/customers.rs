use paygate_core::{AppError, AppResult};
use paygate_domain::{CustomerAttributes, RecordId, ResourceAttributes, ResourceKind, ResourceRecord};

use crate::provider_ports::ProviderUpdate;
use crate::tenant_resolver::TenantContext;

use super::{CreateOutcome, ResourceOrchestrator};

/// Input for creating a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomerInput {
    /// Customer email.
    pub email: String,
    /// Customer display name.
    pub display_name: String,
}

/// Input for updating a customer. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateCustomerInput {
    /// New email.
    pub email: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
}

impl ResourceOrchestrator {
    /// Creates a customer locally and at the provider.
    pub async fn create_customer(
        &self,
        context: &TenantContext,
        natural_key: Option<&str>,
        input: CreateCustomerInput,
    ) -> AppResult<CreateOutcome> {
        let attributes = CustomerAttributes::new(input.email, input.display_name)?;
        self.create_resource(
            context,
            natural_key,
            ResourceAttributes::Customer(attributes),
            Ok(()),
        )
        .await
    }

    /// Updates a customer's contact fields.
    pub async fn update_customer(
        &self,
        context: &TenantContext,
        id: RecordId,
        input: UpdateCustomerInput,
    ) -> AppResult<ResourceRecord> {
        if input.email.is_none() && input.display_name.is_none() {
            return Err(AppError::Validation(
                "customer update must change email or display_name".to_owned(),
            ));
        }

        self.update_resource(context, ResourceKind::Customer, id, |attributes| {
            let ResourceAttributes::Customer(current) = attributes else {
                return Err(AppError::Internal("record is not a customer".to_owned()));
            };

            let changed = current.with_changes(input.email, input.display_name)?;
            let update = ProviderUpdate::Customer {
                email: changed.email().as_str().to_owned(),
                name: changed.display_name().as_str().to_owned(),
            };
            Ok((ResourceAttributes::Customer(changed), update))
        })
        .await
    }
}
