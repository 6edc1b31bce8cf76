//! Tenant-scoped orchestration of provider-backed resources.
//!
//! Every operation takes the request's [`TenantContext`]; record ownership is
//! checked against it at the storage boundary and the provider is always
//! called with the same tenant's credential.

use std::sync::Arc;

use paygate_domain::ResourceRecord;

use crate::provider_call::ProviderCaller;
use crate::resource_ports::ResourceRepository;

mod customers;
mod lifecycle;
mod remote_state;
mod setup_intents;
mod subscription_items;
mod subscriptions;
mod tax_rates;

pub use customers::{CreateCustomerInput, UpdateCustomerInput};
pub use setup_intents::CreateSetupIntentInput;
pub use subscription_items::{CreateSubscriptionItemInput, UpdateSubscriptionItemInput};
pub use subscriptions::{CreateSubscriptionInput, UpdateSubscriptionInput};
pub use tax_rates::{CreateTaxRateInput, UpdateTaxRateInput};

/// How a create request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDisposition {
    /// A new record was allocated and created remotely.
    Created,
    /// A settled record with the same natural key was returned.
    Replayed,
    /// A record with the same natural key is still pending.
    InFlight,
}

/// Record returned by a create operation and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    /// Resulting record.
    pub record: ResourceRecord,
    /// Whether the request created, replayed or joined an in-flight record.
    pub disposition: CreateDisposition,
}

/// Core service mapping local records to remote provider objects.
#[derive(Clone)]
pub struct ResourceOrchestrator {
    resources: Arc<dyn ResourceRepository>,
    caller: ProviderCaller,
}

impl ResourceOrchestrator {
    /// Creates a resource orchestrator.
    #[must_use]
    pub fn new(resources: Arc<dyn ResourceRepository>, caller: ProviderCaller) -> Self {
        Self { resources, caller }
    }
}
