use async_trait::async_trait;

use paygate_core::ProviderResult;
use paygate_domain::{
    Percentage, ProviderCredential, ResourceKind, SetupIntentStatus, SetupIntentUsage,
    SubscriptionStatus,
};

/// Create request for one remote provider object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequest {
    /// Create a customer.
    Customer {
        /// Customer email.
        email: String,
        /// Customer display name.
        name: String,
    },
    /// Create a subscription for an existing remote customer.
    Subscription {
        /// Remote customer id.
        customer: String,
        /// Remote price id.
        price: String,
        /// Plan quantity.
        quantity: u32,
    },
    /// Add an item to an existing remote subscription.
    SubscriptionItem {
        /// Remote subscription id.
        subscription: String,
        /// Remote price id.
        price: String,
        /// Item quantity.
        quantity: u32,
    },
    /// Create a setup intent for an existing remote customer.
    SetupIntent {
        /// Remote customer id.
        customer: String,
        /// Intended future usage.
        usage: SetupIntentUsage,
    },
    /// Create a tax rate.
    TaxRate {
        /// Display name.
        display_name: String,
        /// Tax percentage.
        percentage: Percentage,
        /// Whether the tax is included in prices.
        inclusive: bool,
        /// Optional jurisdiction label.
        jurisdiction: Option<String>,
    },
}

impl ProviderRequest {
    /// Returns the resource kind this request creates.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Customer { .. } => ResourceKind::Customer,
            Self::Subscription { .. } => ResourceKind::Subscription,
            Self::SubscriptionItem { .. } => ResourceKind::SubscriptionItem,
            Self::SetupIntent { .. } => ResourceKind::SetupIntent,
            Self::TaxRate { .. } => ResourceKind::TaxRate,
        }
    }
}

/// Mutable fields sent to the provider for an existing object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderUpdate {
    /// Customer contact fields.
    Customer {
        /// Customer email.
        email: String,
        /// Customer display name.
        name: String,
    },
    /// Subscription renewal flag.
    Subscription {
        /// Whether to cancel at the end of the current period.
        cancel_at_period_end: bool,
    },
    /// Subscription item quantity.
    SubscriptionItem {
        /// New quantity.
        quantity: u32,
    },
    /// Tax rate display fields.
    TaxRate {
        /// Display name.
        display_name: String,
        /// Whether the rate can be applied.
        active: bool,
    },
}

impl ProviderUpdate {
    /// Returns the resource kind this update targets.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Customer { .. } => ResourceKind::Customer,
            Self::Subscription { .. } => ResourceKind::Subscription,
            Self::SubscriptionItem { .. } => ResourceKind::SubscriptionItem,
            Self::TaxRate { .. } => ResourceKind::TaxRate,
        }
    }
}

/// Remote object returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderObject {
    /// Customer object.
    Customer {
        /// Remote id.
        id: String,
    },
    /// Subscription object.
    Subscription {
        /// Remote id.
        id: String,
        /// Remote status.
        status: SubscriptionStatus,
        /// Whether the subscription ends at period end.
        cancel_at_period_end: bool,
    },
    /// Subscription item object.
    SubscriptionItem {
        /// Remote id.
        id: String,
        /// Remote quantity.
        quantity: u32,
    },
    /// Setup intent object.
    SetupIntent {
        /// Remote id.
        id: String,
        /// Remote status.
        status: SetupIntentStatus,
        /// Secret the tenant's front end confirms the intent with.
        client_secret: Option<String>,
    },
    /// Tax rate object.
    TaxRate {
        /// Remote id.
        id: String,
        /// Whether the rate is active.
        active: bool,
    },
    /// Confirmation that an object was deleted.
    Deleted {
        /// Kind of the deleted object.
        kind: ResourceKind,
        /// Remote id.
        id: String,
    },
}

impl ProviderObject {
    /// Returns the remote id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Customer { id }
            | Self::Subscription { id, .. }
            | Self::SubscriptionItem { id, .. }
            | Self::SetupIntent { id, .. }
            | Self::TaxRate { id, .. }
            | Self::Deleted { id, .. } => id.as_str(),
        }
    }

    /// Returns the resource kind of the object.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Customer { .. } => ResourceKind::Customer,
            Self::Subscription { .. } => ResourceKind::Subscription,
            Self::SubscriptionItem { .. } => ResourceKind::SubscriptionItem,
            Self::SetupIntent { .. } => ResourceKind::SetupIntent,
            Self::TaxRate { .. } => ResourceKind::TaxRate,
            Self::Deleted { kind, .. } => *kind,
        }
    }
}

/// Port for the remote payment provider.
///
/// Every call carries the resolved tenant's credential; adapters must not
/// hold a credential of their own.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a remote object. Replays with the same idempotency key return
    /// the original object.
    async fn create(
        &self,
        credential: &ProviderCredential,
        request: &ProviderRequest,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject>;

    /// Retrieves the current state of a remote object.
    async fn retrieve(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
    ) -> ProviderResult<ProviderObject>;

    /// Updates mutable fields of a remote object.
    async fn update(
        &self,
        credential: &ProviderCredential,
        provider_id: &str,
        update: &ProviderUpdate,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject>;

    /// Cancels, deletes or deactivates a remote object, depending on its kind.
    async fn cancel(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject>;
}
