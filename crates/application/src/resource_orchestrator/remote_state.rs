use paygate_core::{AppError, AppResult};
use paygate_domain::{ResourceAttributes, SetupIntentStatus, SubscriptionStatus};

use crate::provider_ports::ProviderObject;

/// Folds the provider's view of an object into local attributes.
///
/// Fields the caller owns (emails, names, prices) keep their local values;
/// provider-owned fields (statuses, secrets) are taken from the provider.
pub(super) fn merge_remote(
    attributes: &ResourceAttributes,
    object: &ProviderObject,
) -> AppResult<ResourceAttributes> {
    if object.kind() != attributes.kind() {
        return Err(AppError::Internal(format!(
            "provider returned a {} object for a {} record",
            object.kind(),
            attributes.kind()
        )));
    }

    let merged = match (attributes, object) {
        (
            ResourceAttributes::Subscription(local),
            ProviderObject::Subscription {
                status,
                cancel_at_period_end,
                ..
            },
        ) => ResourceAttributes::Subscription(
            local.with_provider_state(status.clone(), *cancel_at_period_end),
        ),
        (ResourceAttributes::SubscriptionItem(local), ProviderObject::SubscriptionItem {
            quantity,
            ..
        }) => ResourceAttributes::SubscriptionItem(local.with_quantity(*quantity)),
        (
            ResourceAttributes::SetupIntent(local),
            ProviderObject::SetupIntent {
                status,
                client_secret,
                ..
            },
        ) => ResourceAttributes::SetupIntent(
            local.with_provider_state(status.clone(), client_secret.clone()),
        ),
        (ResourceAttributes::TaxRate(local), ProviderObject::TaxRate { active, .. }) => {
            ResourceAttributes::TaxRate(local.with_changes(None, Some(*active))?)
        }
        _ => attributes.clone(),
    };

    Ok(merged)
}

/// Attributes of a record after the provider confirmed its cancellation.
pub(super) fn canceled_attributes(
    attributes: &ResourceAttributes,
    object: &ProviderObject,
) -> AppResult<ResourceAttributes> {
    let merged = merge_remote(attributes, object)?;

    Ok(match merged {
        ResourceAttributes::TaxRate(local) => ResourceAttributes::TaxRate(local.deactivated()),
        ResourceAttributes::Subscription(local) if !local.status().is_ended() => {
            ResourceAttributes::Subscription(
                local.with_provider_state(SubscriptionStatus::Canceled, false),
            )
        }
        ResourceAttributes::SetupIntent(local)
            if *local.status() != SetupIntentStatus::Canceled =>
        {
            ResourceAttributes::SetupIntent(
                local.with_provider_state(SetupIntentStatus::Canceled, None),
            )
        }
        other => other,
    })
}

/// Returns whether the provider reports the object as ended.
pub(super) fn remote_has_ended(object: &ProviderObject) -> bool {
    match object {
        ProviderObject::Subscription { status, .. } => status.is_ended(),
        ProviderObject::SetupIntent { status, .. } => *status == SetupIntentStatus::Canceled,
        ProviderObject::Deleted { .. } => true,
        ProviderObject::Customer { .. }
        | ProviderObject::SubscriptionItem { .. }
        | ProviderObject::TaxRate { .. } => false,
    }
}
