use paygate_application::{
    CreateSubscriptionInput, CreateSubscriptionItemInput, UpdateSubscriptionInput,
    UpdateSubscriptionItemInput,
};
use paygate_core::AppError;
use paygate_domain::{RecordId, ResourceAttributes, ResourceKind, ResourceRecord};
use serde::{Deserialize, Serialize};

use super::common::{RecordStatusResponse, unexpected_attributes};

/// Incoming payload for subscription creation.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub customer_id: String,
    pub price_reference: String,
    pub quantity: Option<i64>,
}

impl TryFrom<CreateSubscriptionRequest> for CreateSubscriptionInput {
    type Error = AppError;

    fn try_from(request: CreateSubscriptionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            customer_id: RecordId::parse(request.customer_id.as_str())?,
            price_reference: request.price_reference,
            quantity: request.quantity,
        })
    }
}

/// Incoming payload for subscription updates.
#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub cancel_at_period_end: bool,
}

impl From<UpdateSubscriptionRequest> for UpdateSubscriptionInput {
    fn from(request: UpdateSubscriptionRequest) -> Self {
        Self {
            cancel_at_period_end: request.cancel_at_period_end,
        }
    }
}

/// API representation of a subscription.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub customer_id: String,
    pub provider_subscription_id: Option<String>,
    pub price_reference: String,
    pub quantity: u32,
    pub status: String,
    pub cancel_at_period_end: bool,
    #[serde(flatten)]
    pub record: RecordStatusResponse,
}

impl TryFrom<ResourceRecord> for SubscriptionResponse {
    type Error = AppError;

    fn try_from(record: ResourceRecord) -> Result<Self, Self::Error> {
        let ResourceAttributes::Subscription(attributes) = record.attributes() else {
            return Err(unexpected_attributes(&record, ResourceKind::Subscription));
        };

        Ok(Self {
            id: record.id().to_string(),
            customer_id: attributes.customer_id().to_string(),
            provider_subscription_id: record.provider_id().map(ToOwned::to_owned),
            price_reference: attributes.price_reference().as_str().to_owned(),
            quantity: attributes.quantity(),
            status: attributes.status().as_str().to_owned(),
            cancel_at_period_end: attributes.cancel_at_period_end(),
            record: RecordStatusResponse::from(&record),
        })
    }
}

/// Incoming payload for subscription item creation.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionItemRequest {
    pub subscription_id: String,
    pub price_reference: String,
    pub quantity: i64,
}

impl TryFrom<CreateSubscriptionItemRequest> for CreateSubscriptionItemInput {
    type Error = AppError;

    fn try_from(request: CreateSubscriptionItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            subscription_id: RecordId::parse(request.subscription_id.as_str())?,
            price_reference: request.price_reference,
            quantity: request.quantity,
        })
    }
}

/// Incoming payload for subscription item updates.
#[derive(Debug, Deserialize)]
pub struct UpdateSubscriptionItemRequest {
    pub quantity: i64,
}

impl From<UpdateSubscriptionItemRequest> for UpdateSubscriptionItemInput {
    fn from(request: UpdateSubscriptionItemRequest) -> Self {
        Self {
            quantity: request.quantity,
        }
    }
}

/// Query parameters for listing subscription items.
#[derive(Debug, Deserialize)]
pub struct SubscriptionItemListQuery {
    pub subscription_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// API representation of a subscription item.
#[derive(Debug, Serialize)]
pub struct SubscriptionItemResponse {
    pub id: String,
    pub subscription_id: String,
    pub provider_item_id: Option<String>,
    pub price_reference: String,
    pub quantity: u32,
    #[serde(flatten)]
    pub record: RecordStatusResponse,
}

impl TryFrom<ResourceRecord> for SubscriptionItemResponse {
    type Error = AppError;

    fn try_from(record: ResourceRecord) -> Result<Self, Self::Error> {
        let ResourceAttributes::SubscriptionItem(attributes) = record.attributes() else {
            return Err(unexpected_attributes(&record, ResourceKind::SubscriptionItem));
        };

        Ok(Self {
            id: record.id().to_string(),
            subscription_id: attributes.subscription_id().to_string(),
            provider_item_id: record.provider_id().map(ToOwned::to_owned),
            price_reference: attributes.price_reference().as_str().to_owned(),
            quantity: attributes.quantity(),
            record: RecordStatusResponse::from(&record),
        })
    }
}
