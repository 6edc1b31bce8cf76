mod common;
mod customers;
mod setup_intents;
mod subscriptions;
mod tax_rates;
mod tenants;

pub use common::{
    DataEnvelope, HealthDependencyStatus, HealthResponse, ListEnvelope, ListQuery,
    RecordStatusResponse,
};
pub use customers::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest};
pub use setup_intents::{CreateSetupIntentRequest, SetupIntentResponse};
pub use subscriptions::{
    CreateSubscriptionItemRequest, CreateSubscriptionRequest, SubscriptionItemListQuery,
    SubscriptionItemResponse, SubscriptionResponse, UpdateSubscriptionItemRequest,
    UpdateSubscriptionRequest,
};
pub use tax_rates::{CreateTaxRateRequest, TaxRateResponse, UpdateTaxRateRequest};
pub use tenants::{CreateTenantRequest, ProvisionedTenantResponse, TenantResponse};
