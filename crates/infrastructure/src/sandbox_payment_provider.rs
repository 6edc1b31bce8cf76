//! In-memory stand-in for the payment provider used in development and tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use paygate_application::{PaymentProvider, ProviderObject, ProviderRequest, ProviderUpdate};
use paygate_core::{ProviderError, ProviderResult};
use paygate_domain::{ProviderCredential, ResourceKind, SetupIntentStatus, SubscriptionStatus};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct SandboxState {
    failures: VecDeque<ProviderError>,
    replies: HashMap<(String, String), ProviderObject>,
    objects: HashMap<(String, String), ProviderObject>,
    subscriptions_by_customer: HashMap<(String, String), Vec<String>>,
}

impl SandboxState {
    fn object(&self, credential: &str, provider_id: &str) -> ProviderResult<&ProviderObject> {
        self.objects
            .get(&(credential.to_owned(), provider_id.to_owned()))
            .ok_or_else(|| ProviderError::InvalidRequest(format!("No such object: '{provider_id}'")))
    }

    fn live_object(
        &self,
        credential: &str,
        kind: ResourceKind,
        provider_id: &str,
    ) -> ProviderResult<&ProviderObject> {
        match self.object(credential, provider_id)? {
            object if object.kind() != kind => Err(ProviderError::InvalidRequest(format!(
                "No such {}: '{provider_id}'",
                kind.label()
            ))),
            ProviderObject::Deleted { .. } => Err(ProviderError::InvalidRequest(format!(
                "{} '{provider_id}' has been deleted",
                kind.label()
            ))),
            object => Ok(object),
        }
    }

    /// Deleting a customer cancels its subscriptions.
    fn cancel_subscriptions_of(&mut self, credential: &str, customer: &str) {
        let subscriptions = self
            .subscriptions_by_customer
            .get(&(credential.to_owned(), customer.to_owned()))
            .cloned()
            .unwrap_or_default();

        for id in subscriptions {
            self.store(
                credential,
                ProviderObject::Subscription {
                    id,
                    status: SubscriptionStatus::Canceled,
                    cancel_at_period_end: false,
                },
            );
        }
    }

    fn store(&mut self, credential: &str, object: ProviderObject) {
        self.objects
            .insert((credential.to_owned(), object.id().to_owned()), object);
    }
}

/// Provider adapter that keeps objects in memory.
///
/// Objects are visible only to the credential that created them, and replays
/// of a mutating call with the same idempotency key return the first reply.
#[derive(Debug, Default)]
pub struct SandboxPaymentProvider {
    state: Mutex<SandboxState>,
}

impl SandboxPaymentProvider {
    /// Creates an empty sandbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next calls fail with `errors`, in order.
    pub async fn fail_next(&self, errors: impl IntoIterator<Item = ProviderError>) {
        self.state.lock().await.failures.extend(errors);
    }

    /// Number of objects created under `credential`.
    pub async fn object_count(&self, credential: &ProviderCredential) -> usize {
        self.state
            .lock()
            .await
            .objects
            .keys()
            .filter(|(owner, _)| owner == credential.expose())
            .count()
    }

    async fn replay_or<F>(
        &self,
        credential: &ProviderCredential,
        idempotency_key: &str,
        apply: F,
    ) -> ProviderResult<ProviderObject>
    where
        F: FnOnce(&mut SandboxState, &str) -> ProviderResult<ProviderObject>,
    {
        let mut state = self.state.lock().await;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        let reply_key = (credential.expose().to_owned(), idempotency_key.to_owned());
        if let Some(reply) = state.replies.get(&reply_key) {
            debug!(idempotency_key, "sandbox replayed idempotent request");
            return Ok(reply.clone());
        }

        let object = apply(&mut *state, credential.expose())?;
        state.store(credential.expose(), object.clone());
        state.replies.insert(reply_key, object.clone());
        Ok(object)
    }
}

fn remote_id(prefix: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &simple[..14])
}

#[async_trait]
impl PaymentProvider for SandboxPaymentProvider {
    async fn create(
        &self,
        credential: &ProviderCredential,
        request: &ProviderRequest,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        self.replay_or(credential, idempotency_key, |state, owner| {
            let object = match request {
                ProviderRequest::Customer { .. } => ProviderObject::Customer {
                    id: remote_id("cus"),
                },
                ProviderRequest::Subscription { customer, .. } => {
                    state.live_object(owner, ResourceKind::Customer, customer)?;
                    let id = remote_id("sub");
                    state
                        .subscriptions_by_customer
                        .entry((owner.to_owned(), customer.clone()))
                        .or_default()
                        .push(id.clone());
                    ProviderObject::Subscription {
                        id,
                        status: SubscriptionStatus::Active,
                        cancel_at_period_end: false,
                    }
                }
                ProviderRequest::SubscriptionItem {
                    subscription,
                    quantity,
                    ..
                } => {
                    if let ProviderObject::Subscription { status, .. } =
                        state.live_object(owner, ResourceKind::Subscription, subscription)?
                        && status.is_ended()
                    {
                        return Err(ProviderError::InvalidRequest(format!(
                            "subscription '{subscription}' is no longer active"
                        )));
                    }
                    ProviderObject::SubscriptionItem {
                        id: remote_id("si"),
                        quantity: *quantity,
                    }
                }
                ProviderRequest::SetupIntent { customer, .. } => {
                    state.live_object(owner, ResourceKind::Customer, customer)?;
                    let id = remote_id("seti");
                    ProviderObject::SetupIntent {
                        client_secret: Some(format!("{id}_secret_{}", remote_id("sandbox"))),
                        id,
                        status: SetupIntentStatus::RequiresPaymentMethod,
                    }
                }
                ProviderRequest::TaxRate { .. } => ProviderObject::TaxRate {
                    id: remote_id("txr"),
                    active: true,
                },
            };
            Ok(object)
        })
        .await
    }

    async fn retrieve(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
    ) -> ProviderResult<ProviderObject> {
        let mut state = self.state.lock().await;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }

        match state.object(credential.expose(), provider_id)? {
            object if object.kind() == kind => Ok(object.clone()),
            _ => Err(ProviderError::InvalidRequest(format!(
                "No such {}: '{provider_id}'",
                kind.label()
            ))),
        }
    }

    async fn update(
        &self,
        credential: &ProviderCredential,
        provider_id: &str,
        update: &ProviderUpdate,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        self.replay_or(credential, idempotency_key, |state, owner| {
            let current = state.live_object(owner, update.kind(), provider_id)?.clone();
            let updated = match (current, update) {
                (current @ ProviderObject::Customer { .. }, ProviderUpdate::Customer { .. }) => {
                    current
                }
                (
                    ProviderObject::Subscription { id, status, .. },
                    ProviderUpdate::Subscription {
                        cancel_at_period_end,
                    },
                ) => ProviderObject::Subscription {
                    id,
                    status,
                    cancel_at_period_end: *cancel_at_period_end,
                },
                (
                    ProviderObject::SubscriptionItem { id, .. },
                    ProviderUpdate::SubscriptionItem { quantity },
                ) => ProviderObject::SubscriptionItem {
                    id,
                    quantity: *quantity,
                },
                (ProviderObject::TaxRate { id, .. }, ProviderUpdate::TaxRate { active, .. }) => {
                    ProviderObject::TaxRate {
                        id,
                        active: *active,
                    }
                }
                _ => {
                    return Err(ProviderError::InvalidRequest(format!(
                        "cannot apply {} update to '{provider_id}'",
                        update.kind().label()
                    )));
                }
            };
            Ok(updated)
        })
        .await
    }

    async fn cancel(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        self.replay_or(credential, idempotency_key, |state, owner| {
            let canceled = match state.live_object(owner, kind, provider_id)?.clone() {
                ProviderObject::Subscription { id, .. } => ProviderObject::Subscription {
                    id,
                    status: SubscriptionStatus::Canceled,
                    cancel_at_period_end: false,
                },
                ProviderObject::SetupIntent {
                    id, client_secret, ..
                } => ProviderObject::SetupIntent {
                    id,
                    status: SetupIntentStatus::Canceled,
                    client_secret,
                },
                ProviderObject::TaxRate { id, .. } => ProviderObject::TaxRate { id, active: false },
                other => ProviderObject::Deleted {
                    kind,
                    id: other.id().to_owned(),
                },
            };
            if kind == ResourceKind::Customer {
                state.cancel_subscriptions_of(owner, provider_id);
            }
            Ok(canceled)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use paygate_application::{PaymentProvider, ProviderObject, ProviderRequest};
    use paygate_core::ProviderError;
    use paygate_domain::{ProviderCredential, ResourceKind, SubscriptionStatus};

    use super::SandboxPaymentProvider;

    fn credential(value: &str) -> ProviderCredential {
        ProviderCredential::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn customer_request() -> ProviderRequest {
        ProviderRequest::Customer {
            email: "ada@example.com".to_owned(),
            name: "Ada".to_owned(),
        }
    }

    #[tokio::test]
    async fn replayed_idempotency_key_returns_the_same_object() {
        let sandbox = SandboxPaymentProvider::new();
        let acme = credential("sk_test_acme");

        let first = sandbox.create(&acme, &customer_request(), "key-1").await;
        let second = sandbox.create(&acme, &customer_request(), "key-1").await;

        assert!(first.is_ok());
        assert_eq!(first.ok(), second.ok());
        assert_eq!(sandbox.object_count(&acme).await, 1);
    }

    #[tokio::test]
    async fn objects_are_scoped_to_their_credential() {
        let sandbox = SandboxPaymentProvider::new();
        let acme = credential("sk_test_acme");
        let globex = credential("sk_test_globex");
        let customer = sandbox
            .create(&acme, &customer_request(), "key-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        let foreign = sandbox
            .retrieve(&globex, ResourceKind::Customer, customer.id())
            .await;
        let subscription = sandbox
            .create(
                &globex,
                &ProviderRequest::Subscription {
                    customer: customer.id().to_owned(),
                    price: "price_basic".to_owned(),
                    quantity: 1,
                },
                "key-2",
            )
            .await;

        assert!(matches!(foreign, Err(ProviderError::InvalidRequest(_))));
        assert!(matches!(subscription, Err(ProviderError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn scripted_failures_come_first() {
        let sandbox = SandboxPaymentProvider::new();
        let acme = credential("sk_test_acme");
        sandbox
            .fail_next([ProviderError::Transient("connection reset".to_owned())])
            .await;

        let failed = sandbox.create(&acme, &customer_request(), "key-1").await;
        let retried = sandbox.create(&acme, &customer_request(), "key-1").await;

        assert!(matches!(failed, Err(ProviderError::Transient(_))));
        assert!(matches!(retried, Ok(ProviderObject::Customer { .. })));
    }

    #[tokio::test]
    async fn canceled_subscription_rejects_new_items() {
        let sandbox = SandboxPaymentProvider::new();
        let acme = credential("sk_test_acme");
        let customer = sandbox
            .create(&acme, &customer_request(), "key-1")
            .await
            .unwrap_or_else(|_| unreachable!());
        let subscription = sandbox
            .create(
                &acme,
                &ProviderRequest::Subscription {
                    customer: customer.id().to_owned(),
                    price: "price_basic".to_owned(),
                    quantity: 1,
                },
                "key-2",
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let canceled = sandbox
            .cancel(&acme, ResourceKind::Subscription, subscription.id(), "key-3")
            .await;
        let item = sandbox
            .create(
                &acme,
                &ProviderRequest::SubscriptionItem {
                    subscription: subscription.id().to_owned(),
                    price: "price_addon".to_owned(),
                    quantity: 1,
                },
                "key-4",
            )
            .await;

        assert!(matches!(
            canceled,
            Ok(ProviderObject::Subscription {
                status: SubscriptionStatus::Canceled,
                ..
            })
        ));
        assert!(matches!(item, Err(ProviderError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn deleted_customers_stay_retrievable_as_deleted() {
        let sandbox = SandboxPaymentProvider::new();
        let acme = credential("sk_test_acme");
        let customer = sandbox
            .create(&acme, &customer_request(), "key-1")
            .await
            .unwrap_or_else(|_| unreachable!());

        let _ = sandbox
            .cancel(&acme, ResourceKind::Customer, customer.id(), "key-2")
            .await;
        let retrieved = sandbox
            .retrieve(&acme, ResourceKind::Customer, customer.id())
            .await;

        assert!(matches!(retrieved, Ok(ProviderObject::Deleted { .. })));
    }

    #[tokio::test]
    async fn deleting_a_customer_cancels_its_subscriptions() {
        let sandbox = SandboxPaymentProvider::new();
        let acme = credential("sk_test_acme");
        let customer = sandbox
            .create(&acme, &customer_request(), "key-1")
            .await
            .unwrap_or_else(|_| unreachable!());
        let subscription = sandbox
            .create(
                &acme,
                &ProviderRequest::Subscription {
                    customer: customer.id().to_owned(),
                    price: "price_basic".to_owned(),
                    quantity: 1,
                },
                "key-2",
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let _ = sandbox
            .cancel(&acme, ResourceKind::Customer, customer.id(), "key-3")
            .await;
        let retrieved = sandbox
            .retrieve(&acme, ResourceKind::Subscription, subscription.id())
            .await;

        assert!(matches!(
            retrieved,
            Ok(ProviderObject::Subscription {
                status: SubscriptionStatus::Canceled,
                ..
            })
        ));
    }
}
