//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod customer;
mod resource;
mod setup_intent;
mod subscription;
mod tax_rate;
mod tenant;

pub use customer::{CustomerAttributes, EmailAddress};
pub use resource::{
    NewResourceRecord, RecordId, RecordState, ResourceAttributes, ResourceKind, ResourceRecord,
    StoredResourceRecord,
};
pub use setup_intent::{SetupIntentAttributes, SetupIntentStatus, SetupIntentUsage};
pub use subscription::{
    MAX_QUANTITY, PriceReference, SubscriptionAttributes, SubscriptionItemAttributes,
    SubscriptionStatus, parse_quantity,
};
pub use tax_rate::{Percentage, TaxRateAttributes};
pub use tenant::{API_KEY_LENGTH, ApiKey, ProviderCredential, Tenant, TenantStatus};
