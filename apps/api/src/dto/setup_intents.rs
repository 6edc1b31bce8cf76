use paygate_application::CreateSetupIntentInput;
use paygate_core::AppError;
use paygate_domain::{RecordId, ResourceAttributes, ResourceKind, ResourceRecord, SetupIntentUsage};
use serde::{Deserialize, Serialize};

use super::common::{RecordStatusResponse, unexpected_attributes};

/// Incoming payload for setup intent creation.
#[derive(Debug, Deserialize)]
pub struct CreateSetupIntentRequest {
    pub customer_id: String,
    pub usage: Option<String>,
}

impl TryFrom<CreateSetupIntentRequest> for CreateSetupIntentInput {
    type Error = AppError;

    fn try_from(request: CreateSetupIntentRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            customer_id: RecordId::parse(request.customer_id.as_str())?,
            usage: request
                .usage
                .as_deref()
                .map(SetupIntentUsage::parse)
                .transpose()?,
        })
    }
}

/// API representation of a setup intent.
#[derive(Debug, Serialize)]
pub struct SetupIntentResponse {
    pub id: String,
    pub customer_id: String,
    pub provider_setup_intent_id: Option<String>,
    pub status: String,
    pub usage: &'static str,
    pub client_secret: Option<String>,
    #[serde(flatten)]
    pub record: RecordStatusResponse,
}

impl TryFrom<ResourceRecord> for SetupIntentResponse {
    type Error = AppError;

    fn try_from(record: ResourceRecord) -> Result<Self, Self::Error> {
        let ResourceAttributes::SetupIntent(attributes) = record.attributes() else {
            return Err(unexpected_attributes(&record, ResourceKind::SetupIntent));
        };

        Ok(Self {
            id: record.id().to_string(),
            customer_id: attributes.customer_id().to_string(),
            provider_setup_intent_id: record.provider_id().map(ToOwned::to_owned),
            status: attributes.status().as_str().to_owned(),
            usage: attributes.usage().as_str(),
            client_secret: attributes.client_secret().map(ToOwned::to_owned),
            record: RecordStatusResponse::from(&record),
        })
    }
}
