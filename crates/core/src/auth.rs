use thiserror::Error;

/// Reasons a bearer credential does not resolve to an active tenant.
///
/// `Missing` and `NotFound` render the same message so that responses do not
/// reveal whether a presented key had a plausible format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("a valid api key is required")]
    Missing,

    /// No tenant owns the presented credential.
    #[error("a valid api key is required")]
    NotFound,

    /// The owning tenant exists but is not active.
    #[error("tenant is suspended")]
    Suspended,
}
