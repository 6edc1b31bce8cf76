use paygate_application::{ProviderRequest, ProviderUpdate};

/// Ordered form fields using the provider's bracketed key syntax.
pub(super) type FormFields = Vec<(&'static str, String)>;

pub(super) fn create_form(request: &ProviderRequest) -> FormFields {
    match request {
        ProviderRequest::Customer { email, name } => {
            vec![("email", email.clone()), ("name", name.clone())]
        }
        ProviderRequest::Subscription {
            customer,
            price,
            quantity,
        } => vec![
            ("customer", customer.clone()),
            ("items[0][price]", price.clone()),
            ("items[0][quantity]", quantity.to_string()),
        ],
        ProviderRequest::SubscriptionItem {
            subscription,
            price,
            quantity,
        } => vec![
            ("subscription", subscription.clone()),
            ("price", price.clone()),
            ("quantity", quantity.to_string()),
        ],
        ProviderRequest::SetupIntent { customer, usage } => vec![
            ("customer", customer.clone()),
            ("usage", usage.as_str().to_owned()),
        ],
        ProviderRequest::TaxRate {
            display_name,
            percentage,
            inclusive,
            jurisdiction,
        } => {
            let mut fields = vec![
                ("display_name", display_name.clone()),
                ("percentage", percentage.to_string()),
                ("inclusive", inclusive.to_string()),
            ];
            if let Some(jurisdiction) = jurisdiction {
                fields.push(("jurisdiction", jurisdiction.clone()));
            }
            fields
        }
    }
}

pub(super) fn update_form(update: &ProviderUpdate) -> FormFields {
    match update {
        ProviderUpdate::Customer { email, name } => {
            vec![("email", email.clone()), ("name", name.clone())]
        }
        ProviderUpdate::Subscription {
            cancel_at_period_end,
        } => vec![("cancel_at_period_end", cancel_at_period_end.to_string())],
        ProviderUpdate::SubscriptionItem { quantity } => {
            vec![("quantity", quantity.to_string())]
        }
        ProviderUpdate::TaxRate {
            display_name,
            active,
        } => vec![
            ("display_name", display_name.clone()),
            ("active", active.to_string()),
        ],
    }
}
