//! Tenant-owned resource records and their local lifecycle.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use paygate_core::{AppError, AppResult, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customer::CustomerAttributes;
use crate::setup_intent::SetupIntentAttributes;
use crate::subscription::{SubscriptionAttributes, SubscriptionItemAttributes};
use crate::tax_rate::TaxRateAttributes;

/// Kind of provider-backed resource managed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Provider customer.
    Customer,
    /// Provider subscription.
    Subscription,
    /// Line item of a subscription.
    SubscriptionItem,
    /// Intent to save a payment method without charging.
    SetupIntent,
    /// Tax rate definition.
    TaxRate,
}

impl ResourceKind {
    /// Every resource kind, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Customer,
        Self::Subscription,
        Self::SubscriptionItem,
        Self::SetupIntent,
        Self::TaxRate,
    ];

    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Subscription => "subscription",
            Self::SubscriptionItem => "subscription_item",
            Self::SetupIntent => "setup_intent",
            Self::TaxRate => "tax_rate",
        }
    }

    /// Parses a storage string into a resource kind.
    pub fn parse(value: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown resource kind '{value}'")))
    }

    /// Returns a human-readable label for messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Subscription => "subscription",
            Self::SubscriptionItem => "subscription item",
            Self::SetupIntent => "setup intent",
            Self::TaxRate => "tax rate",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of a local resource record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a random record identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a record identifier supplied by a caller.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("'{value}' is not a valid record id")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Local lifecycle state of a resource record.
///
/// `pending → active → (canceled | failed)`, `pending → failed`, and
/// `active ⇄ cancellation_pending → canceled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Remote creation is in flight or awaiting reconciliation.
    Pending,
    /// Remote object exists and is mirrored locally.
    Active,
    /// Remote cancel was attempted but not confirmed.
    CancellationPending,
    /// Remote object was canceled, deleted or deactivated.
    Canceled,
    /// Remote creation was rejected.
    Failed,
}

impl RecordState {
    /// Returns the storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::CancellationPending => "cancellation_pending",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        }
    }

    /// Parses a storage string into a record state.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "cancellation_pending" => Ok(Self::CancellationPending),
            "canceled" => Ok(Self::Canceled),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown record state '{value}'"
            ))),
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Failed)
    }

    /// Returns whether the record still needs reconciliation with the provider.
    #[must_use]
    pub fn awaits_reconciliation(&self) -> bool {
        matches!(self, Self::Pending | Self::CancellationPending)
    }

    /// Returns whether moving from this state to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Failed)
                | (Self::Active, Self::CancellationPending)
                | (Self::Active, Self::Canceled)
                | (Self::Active, Self::Failed)
                | (Self::CancellationPending, Self::Canceled)
                | (Self::CancellationPending, Self::Active)
        )
    }
}

/// Kind-specific attributes of a resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceAttributes {
    /// Customer attributes.
    Customer(CustomerAttributes),
    /// Subscription attributes.
    Subscription(SubscriptionAttributes),
    /// Subscription item attributes.
    SubscriptionItem(SubscriptionItemAttributes),
    /// Setup intent attributes.
    SetupIntent(SetupIntentAttributes),
    /// Tax rate attributes.
    TaxRate(TaxRateAttributes),
}

impl ResourceAttributes {
    /// Returns the resource kind described by these attributes.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Customer(_) => ResourceKind::Customer,
            Self::Subscription(_) => ResourceKind::Subscription,
            Self::SubscriptionItem(_) => ResourceKind::SubscriptionItem,
            Self::SetupIntent(_) => ResourceKind::SetupIntent,
            Self::TaxRate(_) => ResourceKind::TaxRate,
        }
    }

    /// Returns the local record this resource hangs off, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<RecordId> {
        match self {
            Self::Subscription(attributes) => Some(attributes.customer_id()),
            Self::SubscriptionItem(attributes) => Some(attributes.subscription_id()),
            Self::SetupIntent(attributes) => Some(attributes.customer_id()),
            Self::Customer(_) | Self::TaxRate(_) => None,
        }
    }
}

/// Input for allocating a new pending record.
#[derive(Debug, Clone)]
pub struct NewResourceRecord {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Caller-supplied natural key used to detect duplicate creates.
    pub natural_key: String,
    /// Digest of the canonical create payload.
    pub request_fingerprint: String,
    /// Requested attributes.
    pub attributes: ResourceAttributes,
}

/// Stored values used to rebuild a record.
#[derive(Debug, Clone)]
pub struct StoredResourceRecord {
    /// Record identifier.
    pub id: RecordId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Natural key.
    pub natural_key: String,
    /// Digest of the canonical create payload.
    pub request_fingerprint: String,
    /// Local lifecycle state.
    pub state: RecordState,
    /// Remote provider object id.
    pub provider_id: Option<String>,
    /// Kind-specific attributes.
    pub attributes: ResourceAttributes,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Last provider error detail.
    pub last_error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Local mirror of one remote provider object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    id: RecordId,
    tenant_id: TenantId,
    natural_key: String,
    request_fingerprint: String,
    state: RecordState,
    provider_id: Option<String>,
    attributes: ResourceAttributes,
    version: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Allocates a new record in the `pending` state.
    pub fn pending(input: NewResourceRecord, now: DateTime<Utc>) -> AppResult<Self> {
        let natural_key = input.natural_key.trim().to_owned();
        if natural_key.is_empty() || natural_key.len() > 255 {
            return Err(AppError::Validation(
                "idempotency key must be between 1 and 255 characters".to_owned(),
            ));
        }

        Ok(Self {
            id: RecordId::new(),
            tenant_id: input.tenant_id,
            natural_key,
            request_fingerprint: input.request_fingerprint,
            state: RecordState::Pending,
            provider_id: None,
            attributes: input.attributes,
            version: 1,
            last_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a record from storage.
    #[must_use]
    pub fn restore(stored: StoredResourceRecord) -> Self {
        Self {
            id: stored.id,
            tenant_id: stored.tenant_id,
            natural_key: stored.natural_key,
            request_fingerprint: stored.request_fingerprint,
            state: stored.state,
            provider_id: stored.provider_id,
            attributes: stored.attributes,
            version: stored.version,
            last_error: stored.last_error,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.attributes.kind()
    }

    /// Returns the natural key.
    #[must_use]
    pub fn natural_key(&self) -> &str {
        self.natural_key.as_str()
    }

    /// Returns the digest of the create payload.
    #[must_use]
    pub fn request_fingerprint(&self) -> &str {
        self.request_fingerprint.as_str()
    }

    /// Returns the local lifecycle state.
    #[must_use]
    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Returns the remote provider object id once known.
    #[must_use]
    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    /// Returns kind-specific attributes.
    #[must_use]
    pub fn attributes(&self) -> &ResourceAttributes {
        &self.attributes
    }

    /// Returns the optimistic concurrency version.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the last provider error detail.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last write timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Idempotency key for the remote create call.
    #[must_use]
    pub fn create_idempotency_key(&self) -> String {
        format!("pg_{}_{}_create", self.kind(), self.id)
    }

    /// Idempotency key for the remote cancel call.
    #[must_use]
    pub fn cancel_idempotency_key(&self) -> String {
        format!("pg_{}_{}_cancel", self.kind(), self.id)
    }

    /// Idempotency key for a remote update issued against the current version.
    #[must_use]
    pub fn update_idempotency_key(&self) -> String {
        format!("pg_{}_{}_update_v{}", self.kind(), self.id, self.version)
    }

    /// Records the remote object and moves `pending → active`.
    pub fn activate(
        &self,
        provider_id: &str,
        attributes: ResourceAttributes,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        self.ensure_same_kind(&attributes)?;

        if let Some(existing) = self.provider_id.as_deref()
            && existing != provider_id
        {
            return Err(AppError::Conflict(format!(
                "{} '{}' is already bound to a different provider object",
                self.kind().label(),
                self.id
            )));
        }

        let mut next = self.transition(RecordState::Active, now)?;
        next.provider_id = Some(provider_id.to_owned());
        next.attributes = attributes;
        next.last_error = None;
        Ok(next)
    }

    /// Replaces attributes of an active record after a confirmed remote update.
    pub fn apply_update(
        &self,
        attributes: ResourceAttributes,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        self.ensure_same_kind(&attributes)?;

        if !matches!(
            self.state,
            RecordState::Active | RecordState::CancellationPending
        ) {
            return Err(AppError::Validation(format!(
                "{} '{}' cannot be updated while {}",
                self.kind().label(),
                self.id,
                self.state.as_str()
            )));
        }

        let mut next = self.touch(now);
        next.attributes = attributes;
        next.last_error = None;
        Ok(next)
    }

    /// Marks the record failed with the provider's detail.
    pub fn fail(&self, detail: &str, now: DateTime<Utc>) -> AppResult<Self> {
        let mut next = self.transition(RecordState::Failed, now)?;
        next.last_error = Some(detail.to_owned());
        Ok(next)
    }

    /// Flags that the remote cancel was attempted but not confirmed.
    pub fn flag_cancellation_pending(&self, detail: &str, now: DateTime<Utc>) -> AppResult<Self> {
        let mut next = if self.state == RecordState::CancellationPending {
            self.touch(now)
        } else {
            self.transition(RecordState::CancellationPending, now)?
        };
        next.last_error = Some(detail.to_owned());
        Ok(next)
    }

    /// Returns a cancellation-pending record to active after the provider refused the cancel.
    pub fn revert_cancellation(&self, detail: &str, now: DateTime<Utc>) -> AppResult<Self> {
        if self.state != RecordState::CancellationPending {
            return Err(AppError::Validation(format!(
                "{} '{}' has no pending cancellation",
                self.kind().label(),
                self.id
            )));
        }

        let mut next = self.transition(RecordState::Active, now)?;
        next.last_error = Some(detail.to_owned());
        Ok(next)
    }

    /// Marks the record canceled after the provider confirmed it.
    pub fn cancel(&self, attributes: ResourceAttributes, now: DateTime<Utc>) -> AppResult<Self> {
        self.ensure_same_kind(&attributes)?;
        let mut next = self.transition(RecordState::Canceled, now)?;
        next.attributes = attributes;
        next.last_error = None;
        Ok(next)
    }

    /// Records a provider error without changing state.
    #[must_use]
    pub fn note_error(&self, detail: &str, now: DateTime<Utc>) -> Self {
        let mut next = self.touch(now);
        next.last_error = Some(detail.to_owned());
        next
    }

    fn transition(&self, state: RecordState, now: DateTime<Utc>) -> AppResult<Self> {
        if !self.state.can_transition_to(state) {
            return Err(AppError::Validation(format!(
                "{} '{}' cannot move from {} to {}",
                self.kind().label(),
                self.id,
                self.state.as_str(),
                state.as_str()
            )));
        }

        let mut next = self.touch(now);
        next.state = state;
        Ok(next)
    }

    fn touch(&self, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.version = self.version.saturating_add(1);
        next.updated_at = now;
        next
    }

    fn ensure_same_kind(&self, attributes: &ResourceAttributes) -> AppResult<()> {
        if attributes.kind() != self.kind() {
            return Err(AppError::Internal(format!(
                "attributes of kind '{}' cannot be applied to {} '{}'",
                attributes.kind(),
                self.kind(),
                self.id
            )));
        }

        Ok(())
    }
}
