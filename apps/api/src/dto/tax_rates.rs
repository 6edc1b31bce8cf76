use paygate_application::{CreateTaxRateInput, UpdateTaxRateInput};
use paygate_core::AppError;
use paygate_domain::{ResourceAttributes, ResourceKind, ResourceRecord};
use serde::{Deserialize, Serialize};

use super::common::{RecordStatusResponse, unexpected_attributes};

/// Incoming payload for tax rate creation.
#[derive(Debug, Deserialize)]
pub struct CreateTaxRateRequest {
    pub display_name: String,
    pub percentage: f64,
    #[serde(default)]
    pub inclusive: bool,
    pub jurisdiction: Option<String>,
}

impl From<CreateTaxRateRequest> for CreateTaxRateInput {
    fn from(request: CreateTaxRateRequest) -> Self {
        Self {
            display_name: request.display_name,
            percentage: request.percentage,
            inclusive: request.inclusive,
            jurisdiction: request.jurisdiction,
        }
    }
}

/// Incoming payload for tax rate updates.
#[derive(Debug, Deserialize)]
pub struct UpdateTaxRateRequest {
    pub display_name: Option<String>,
    pub active: Option<bool>,
}

impl From<UpdateTaxRateRequest> for UpdateTaxRateInput {
    fn from(request: UpdateTaxRateRequest) -> Self {
        Self {
            display_name: request.display_name,
            active: request.active,
        }
    }
}

/// API representation of a tax rate.
#[derive(Debug, Serialize)]
pub struct TaxRateResponse {
    pub id: String,
    pub provider_tax_rate_id: Option<String>,
    pub display_name: String,
    pub percentage: f64,
    pub inclusive: bool,
    pub active: bool,
    pub jurisdiction: Option<String>,
    #[serde(flatten)]
    pub record: RecordStatusResponse,
}

impl TryFrom<ResourceRecord> for TaxRateResponse {
    type Error = AppError;

    fn try_from(record: ResourceRecord) -> Result<Self, Self::Error> {
        let ResourceAttributes::TaxRate(attributes) = record.attributes() else {
            return Err(unexpected_attributes(&record, ResourceKind::TaxRate));
        };

        Ok(Self {
            id: record.id().to_string(),
            provider_tax_rate_id: record.provider_id().map(ToOwned::to_owned),
            display_name: attributes.display_name().as_str().to_owned(),
            percentage: attributes.percentage().as_decimal(),
            inclusive: attributes.inclusive(),
            active: attributes.active(),
            jurisdiction: attributes.jurisdiction().map(ToOwned::to_owned),
            record: RecordStatusResponse::from(&record),
        })
    }
}
