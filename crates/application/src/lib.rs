//! Application services and ports.

#![forbid(unsafe_code)]

mod api_key_crypto;
mod provider_call;
mod provider_ports;
mod reconciliation_service;
mod resource_orchestrator;
mod resource_ports;
mod tenant_admin_service;
mod tenant_ports;
mod tenant_resolver;

#[cfg(test)]
mod test_support;

pub use api_key_crypto::{digest_api_key, digests_match};
pub use provider_call::{ProviderCaller, RetryPolicy};
pub use provider_ports::{PaymentProvider, ProviderObject, ProviderRequest, ProviderUpdate};
pub use reconciliation_service::{ReconciliationReport, ReconciliationService};
pub use resource_orchestrator::{
    CreateCustomerInput, CreateDisposition, CreateOutcome, CreateSetupIntentInput,
    CreateSubscriptionInput, CreateSubscriptionItemInput, CreateTaxRateInput, ResourceOrchestrator,
    UpdateCustomerInput, UpdateSubscriptionInput, UpdateSubscriptionItemInput, UpdateTaxRateInput,
};
pub use resource_ports::{
    AllocationOutcome, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, ResourceListQuery, ResourceRepository,
};
pub use tenant_admin_service::{ProvisionTenantInput, ProvisionedTenant, TenantAdminService};
pub use tenant_ports::{CredentialCipher, StoredTenant, TenantRepository};
pub use tenant_resolver::{TenantContext, TenantResolver};
