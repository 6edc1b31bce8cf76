use paygate_application::{CreateCustomerInput, UpdateCustomerInput};
use paygate_core::AppError;
use paygate_domain::{ResourceAttributes, ResourceKind, ResourceRecord};
use serde::{Deserialize, Serialize};

use super::common::{RecordStatusResponse, unexpected_attributes};

/// Incoming payload for customer creation.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub display_name: String,
}

impl From<CreateCustomerRequest> for CreateCustomerInput {
    fn from(request: CreateCustomerRequest) -> Self {
        Self {
            email: request.email,
            display_name: request.display_name,
        }
    }
}

/// Incoming payload for customer updates.
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<UpdateCustomerRequest> for UpdateCustomerInput {
    fn from(request: UpdateCustomerRequest) -> Self {
        Self {
            email: request.email,
            display_name: request.display_name,
        }
    }
}

/// API representation of a customer.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub provider_customer_id: Option<String>,
    pub email: String,
    pub display_name: String,
    #[serde(flatten)]
    pub record: RecordStatusResponse,
}

impl TryFrom<ResourceRecord> for CustomerResponse {
    type Error = AppError;

    fn try_from(record: ResourceRecord) -> Result<Self, Self::Error> {
        let ResourceAttributes::Customer(attributes) = record.attributes() else {
            return Err(unexpected_attributes(&record, ResourceKind::Customer));
        };

        Ok(Self {
            id: record.id().to_string(),
            provider_customer_id: record.provider_id().map(ToOwned::to_owned),
            email: attributes.email().as_str().to_owned(),
            display_name: attributes.display_name().as_str().to_owned(),
            record: RecordStatusResponse::from(&record),
        })
    }
}
