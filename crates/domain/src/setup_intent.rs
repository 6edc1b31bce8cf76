use paygate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::resource::RecordId;

/// Provider-reported setup intent status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SetupIntentStatus {
    /// Waiting for a payment method.
    RequiresPaymentMethod,
    /// Payment method attached, waiting for confirmation.
    RequiresConfirmation,
    /// Customer action (e.g. 3DS) required.
    RequiresAction,
    /// Provider is processing the setup.
    Processing,
    /// Payment method saved.
    Succeeded,
    /// Canceled.
    Canceled,
    /// Status value this gateway does not model.
    Other(String),
}

impl SetupIntentStatus {
    /// Maps a provider status string.
    #[must_use]
    pub fn from_provider(value: &str) -> Self {
        match value {
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "canceled" => Self::Canceled,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the provider status string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for SetupIntentStatus {
    fn from(value: String) -> Self {
        Self::from_provider(value.as_str())
    }
}

impl From<SetupIntentStatus> for String {
    fn from(value: SetupIntentStatus) -> Self {
        value.as_str().to_owned()
    }
}

/// How the saved payment method will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupIntentUsage {
    /// Charged later without the customer present.
    OffSession,
    /// Charged while the customer is present.
    OnSession,
}

impl SetupIntentUsage {
    /// Returns the provider value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OffSession => "off_session",
            Self::OnSession => "on_session",
        }
    }

    /// Parses a caller-supplied usage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "off_session" => Ok(Self::OffSession),
            "on_session" => Ok(Self::OnSession),
            _ => Err(AppError::Validation(format!(
                "usage must be 'off_session' or 'on_session', got '{value}'"
            ))),
        }
    }
}

/// Setup intent attributes mirrored from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupIntentAttributes {
    customer_id: RecordId,
    usage: SetupIntentUsage,
    status: SetupIntentStatus,
    client_secret: Option<String>,
}

impl SetupIntentAttributes {
    /// Creates attributes for a setup intent that has not reached the provider yet.
    #[must_use]
    pub fn requested(customer_id: RecordId, usage: SetupIntentUsage) -> Self {
        Self {
            customer_id,
            usage,
            status: SetupIntentStatus::RequiresPaymentMethod,
            client_secret: None,
        }
    }

    /// Returns the local customer record id.
    #[must_use]
    pub fn customer_id(&self) -> RecordId {
        self.customer_id
    }

    /// Returns the intended usage.
    #[must_use]
    pub fn usage(&self) -> SetupIntentUsage {
        self.usage
    }

    /// Returns the provider status.
    #[must_use]
    pub fn status(&self) -> &SetupIntentStatus {
        &self.status
    }

    /// Returns the client secret used by the tenant's front end to confirm the intent.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// Returns attributes reflecting the provider's view of the intent.
    #[must_use]
    pub fn with_provider_state(
        &self,
        status: SetupIntentStatus,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            status,
            client_secret: client_secret.or_else(|| self.client_secret.clone()),
            ..self.clone()
        }
    }
}
