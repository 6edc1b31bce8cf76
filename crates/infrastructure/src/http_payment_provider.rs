//! Stripe-compatible HTTP adapter for the payment provider port.

use async_trait::async_trait;
use paygate_application::{PaymentProvider, ProviderObject, ProviderRequest, ProviderUpdate};
use paygate_core::{ProviderError, ProviderResult};
use paygate_domain::{ProviderCredential, ResourceKind};
use reqwest::{Method, RequestBuilder};
use tracing::debug;

mod forms;
mod responses;

use forms::{FormFields, create_form, update_form};
use responses::{error_from_response, object_from_body};

/// Calls the provider's form-encoded REST API with the tenant's secret.
///
/// The client's own timeout bounds each request; callers add retries.
#[derive(Clone)]
pub struct HttpPaymentProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentProvider {
    /// Creates a provider client rooted at `base_url` (for example `https://api.stripe.com`).
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self, kind: ResourceKind) -> String {
        format!("{}/v1/{}", self.base_url, collection_path(kind))
    }

    fn object_url(&self, kind: ResourceKind, provider_id: &str) -> String {
        format!("{}/{provider_id}", self.endpoint(kind))
    }

    async fn send(
        &self,
        kind: ResourceKind,
        request: RequestBuilder,
    ) -> ProviderResult<ProviderObject> {
        let response = request.send().await.map_err(|error| {
            if error.is_timeout() {
                ProviderError::Transient(format!("{} request timed out", kind.label()))
            } else {
                ProviderError::Transient(format!("{} request failed: {error}", kind.label()))
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(|error| {
            ProviderError::Transient(format!(
                "failed to read {} response body: {error}",
                kind.label()
            ))
        })?;

        debug!(kind = kind.as_str(), status = status.as_u16(), "provider responded");

        if status.is_success() {
            object_from_body(kind, body.as_str())
        } else {
            Err(error_from_response(status, retry_after.as_deref(), body.as_str()))
        }
    }

    fn mutation(
        &self,
        method: Method,
        url: String,
        credential: &ProviderCredential,
        idempotency_key: &str,
        fields: &FormFields,
    ) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, url)
            .bearer_auth(credential.expose())
            .header("Idempotency-Key", idempotency_key);

        if fields.is_empty() {
            builder
        } else {
            builder.form(fields)
        }
    }
}

fn collection_path(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Customer => "customers",
        ResourceKind::Subscription => "subscriptions",
        ResourceKind::SubscriptionItem => "subscription_items",
        ResourceKind::SetupIntent => "setup_intents",
        ResourceKind::TaxRate => "tax_rates",
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create(
        &self,
        credential: &ProviderCredential,
        request: &ProviderRequest,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        let kind = request.kind();
        let fields = create_form(request);
        let builder = self.mutation(
            Method::POST,
            self.endpoint(kind),
            credential,
            idempotency_key,
            &fields,
        );

        self.send(kind, builder).await
    }

    async fn retrieve(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
    ) -> ProviderResult<ProviderObject> {
        let builder = self
            .http_client
            .get(self.object_url(kind, provider_id))
            .bearer_auth(credential.expose());

        self.send(kind, builder).await
    }

    async fn update(
        &self,
        credential: &ProviderCredential,
        provider_id: &str,
        update: &ProviderUpdate,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        let kind = update.kind();
        let fields = update_form(update);
        let builder = self.mutation(
            Method::POST,
            self.object_url(kind, provider_id),
            credential,
            idempotency_key,
            &fields,
        );

        self.send(kind, builder).await
    }

    async fn cancel(
        &self,
        credential: &ProviderCredential,
        kind: ResourceKind,
        provider_id: &str,
        idempotency_key: &str,
    ) -> ProviderResult<ProviderObject> {
        let object_url = self.object_url(kind, provider_id);
        let (method, url, fields) = match kind {
            ResourceKind::Customer | ResourceKind::Subscription | ResourceKind::SubscriptionItem => {
                (Method::DELETE, object_url, FormFields::new())
            }
            ResourceKind::SetupIntent => (
                Method::POST,
                format!("{object_url}/cancel"),
                FormFields::new(),
            ),
            ResourceKind::TaxRate => (
                Method::POST,
                object_url,
                vec![("active", "false".to_owned())],
            ),
        };

        let builder = self.mutation(method, url, credential, idempotency_key, &fields);
        self.send(kind, builder).await
    }
}
