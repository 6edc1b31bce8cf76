use paygate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::resource::RecordId;

/// Largest quantity accepted for a subscription or subscription item.
pub const MAX_QUANTITY: u32 = 1_000_000;

/// Validates a caller-supplied quantity.
pub fn parse_quantity(value: i64) -> AppResult<u32> {
    if value < 0 {
        return Err(AppError::Validation(
            "quantity must be greater than or equal to 0".to_owned(),
        ));
    }

    u32::try_from(value)
        .ok()
        .filter(|quantity| *quantity <= MAX_QUANTITY)
        .ok_or_else(|| {
            AppError::Validation(format!("quantity must not exceed {MAX_QUANTITY}"))
        })
}

/// Provider price identifier a subscription or item is billed against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceReference(String);

impl PriceReference {
    /// Creates a validated price reference.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(AppError::Validation(
                "price reference must not be empty".to_owned(),
            ));
        }

        if value.len() > 255 || value.chars().any(|character| !character.is_ascii_graphic()) {
            return Err(AppError::Validation(
                "price reference must be at most 255 visible ASCII characters".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the price identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Provider-reported subscription status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    /// First invoice not yet paid.
    Incomplete,
    /// First invoice was never paid.
    IncompleteExpired,
    /// In a trial period.
    Trialing,
    /// Paid and running.
    Active,
    /// Latest invoice is overdue.
    PastDue,
    /// Overdue past the retry schedule.
    Unpaid,
    /// Canceled at the provider.
    Canceled,
    /// Paused at the provider.
    Paused,
    /// Status value this gateway does not model.
    Other(String),
}

impl SubscriptionStatus {
    /// Maps a provider status string.
    #[must_use]
    pub fn from_provider(value: &str) -> Self {
        match value {
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "trialing" => Self::Trialing,
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "unpaid" => Self::Unpaid,
            "canceled" => Self::Canceled,
            "paused" => Self::Paused,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the provider status string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Unpaid => "unpaid",
            Self::Canceled => "canceled",
            Self::Paused => "paused",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns whether the provider has ended the subscription.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Canceled | Self::IncompleteExpired)
    }
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        Self::from_provider(value.as_str())
    }
}

impl From<SubscriptionStatus> for String {
    fn from(value: SubscriptionStatus) -> Self {
        value.as_str().to_owned()
    }
}

/// Subscription attributes mirrored from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionAttributes {
    customer_id: RecordId,
    price_reference: PriceReference,
    quantity: u32,
    status: SubscriptionStatus,
    cancel_at_period_end: bool,
}

impl SubscriptionAttributes {
    /// Creates attributes for a subscription that has not reached the provider yet.
    pub fn requested(
        customer_id: RecordId,
        price_reference: impl Into<String>,
        quantity: i64,
    ) -> AppResult<Self> {
        Ok(Self {
            customer_id,
            price_reference: PriceReference::new(price_reference)?,
            quantity: parse_quantity(quantity)?,
            status: SubscriptionStatus::Incomplete,
            cancel_at_period_end: false,
        })
    }

    /// Returns the local customer record id.
    #[must_use]
    pub fn customer_id(&self) -> RecordId {
        self.customer_id
    }

    /// Returns the price the subscription bills.
    #[must_use]
    pub fn price_reference(&self) -> &PriceReference {
        &self.price_reference
    }

    /// Returns the plan quantity.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the provider status.
    #[must_use]
    pub fn status(&self) -> &SubscriptionStatus {
        &self.status
    }

    /// Returns whether the subscription ends at the current period end.
    #[must_use]
    pub fn cancel_at_period_end(&self) -> bool {
        self.cancel_at_period_end
    }

    /// Returns attributes reflecting the provider's view of the subscription.
    #[must_use]
    pub fn with_provider_state(&self, status: SubscriptionStatus, cancel_at_period_end: bool) -> Self {
        Self {
            status,
            cancel_at_period_end,
            ..self.clone()
        }
    }
}

/// Subscription item attributes mirrored from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionItemAttributes {
    subscription_id: RecordId,
    price_reference: PriceReference,
    quantity: u32,
}

impl SubscriptionItemAttributes {
    /// Creates validated subscription item attributes.
    pub fn new(
        subscription_id: RecordId,
        price_reference: impl Into<String>,
        quantity: i64,
    ) -> AppResult<Self> {
        Ok(Self {
            subscription_id,
            price_reference: PriceReference::new(price_reference)?,
            quantity: parse_quantity(quantity)?,
        })
    }

    /// Returns the local subscription record id.
    #[must_use]
    pub fn subscription_id(&self) -> RecordId {
        self.subscription_id
    }

    /// Returns the billed price.
    #[must_use]
    pub fn price_reference(&self) -> &PriceReference {
        &self.price_reference
    }

    /// Returns the item quantity.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns attributes with a new quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn negative_quantity_is_rejected() {
        assert!(parse_quantity(-1).is_err());
        assert!(matches!(parse_quantity(0), Ok(0)));
    }

    #[test]
    fn unknown_provider_status_is_preserved() {
        let status = SubscriptionStatus::from_provider("pending_review");
        assert_eq!(status.as_str(), "pending_review");
        assert!(!status.is_ended());
        assert!(SubscriptionStatus::from_provider("canceled").is_ended());
    }

    #[test]
    fn price_reference_rejects_whitespace() {
        assert!(PriceReference::new("price 1").is_err());
        assert!(PriceReference::new("  price_1 ").is_ok());
    }

    proptest! {
        #[test]
        fn quantity_accepts_exactly_the_supported_range(value in -10_000_i64..2_000_000_i64) {
            let parsed = parse_quantity(value);
            let in_range = (0..=i64::from(MAX_QUANTITY)).contains(&value);
            prop_assert_eq!(parsed.is_ok(), in_range);
        }
    }
}
