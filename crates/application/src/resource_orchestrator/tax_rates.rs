use paygate_core::{AppError, AppResult};
use paygate_domain::{RecordId, ResourceAttributes, ResourceKind, ResourceRecord, TaxRateAttributes};

use crate::provider_ports::ProviderUpdate;
use crate::tenant_resolver::TenantContext;

use super::{CreateOutcome, ResourceOrchestrator};

/// Input for creating a tax rate.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTaxRateInput {
    /// Display name shown on invoices.
    pub display_name: String,
    /// Percentage between 0 and 100.
    pub percentage: f64,
    /// Whether the tax is included in prices.
    pub inclusive: bool,
    /// Optional jurisdiction label.
    pub jurisdiction: Option<String>,
}

/// Input for updating a tax rate. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaxRateInput {
    /// New display name.
    pub display_name: Option<String>,
    /// New active flag.
    pub active: Option<bool>,
}

impl ResourceOrchestrator {
    /// Creates a tax rate locally and at the provider.
    pub async fn create_tax_rate(
        &self,
        context: &TenantContext,
        natural_key: Option<&str>,
        input: CreateTaxRateInput,
    ) -> AppResult<CreateOutcome> {
        let attributes = TaxRateAttributes::new(
            input.display_name,
            input.percentage,
            input.inclusive,
            input.jurisdiction,
        )?;
        self.create_resource(
            context,
            natural_key,
            ResourceAttributes::TaxRate(attributes),
            Ok(()),
        )
        .await
    }

    /// Updates a tax rate's display name or active flag.
    pub async fn update_tax_rate(
        &self,
        context: &TenantContext,
        id: RecordId,
        input: UpdateTaxRateInput,
    ) -> AppResult<ResourceRecord> {
        if input.display_name.is_none() && input.active.is_none() {
            return Err(AppError::Validation(
                "tax rate update must change display_name or active".to_owned(),
            ));
        }

        self.update_resource(context, ResourceKind::TaxRate, id, |attributes| {
            let ResourceAttributes::TaxRate(current) = attributes else {
                return Err(AppError::Internal("record is not a tax rate".to_owned()));
            };

            let changed = current.with_changes(input.display_name, input.active)?;
            let update = ProviderUpdate::TaxRate {
                display_name: changed.display_name().as_str().to_owned(),
                active: changed.active(),
            };
            Ok((ResourceAttributes::TaxRate(changed), update))
        })
        .await
    }
}
