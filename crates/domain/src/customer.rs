use paygate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Customer attributes mirrored from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAttributes {
    email: EmailAddress,
    display_name: NonEmptyString,
}

impl CustomerAttributes {
    /// Creates validated customer attributes.
    pub fn new(email: impl Into<String>, display_name: impl Into<String>) -> AppResult<Self> {
        let display_name = display_name.into();
        if display_name.chars().count() > 256 {
            return Err(AppError::Validation(
                "customer name must not exceed 256 characters".to_owned(),
            ));
        }

        Ok(Self {
            email: EmailAddress::new(email)?,
            display_name: NonEmptyString::new(display_name.trim())?,
        })
    }

    /// Returns the customer email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the customer display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns attributes with the given fields replaced.
    pub fn with_changes(
        &self,
        email: Option<String>,
        display_name: Option<String>,
    ) -> AppResult<Self> {
        Self::new(
            email.unwrap_or_else(|| self.email.as_str().to_owned()),
            display_name.unwrap_or_else(|| self.display_name.as_str().to_owned()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_is_normalized() {
        let email = EmailAddress::new("  USER@Example.COM ");
        assert!(matches!(email, Ok(ref value) if value.as_str() == "user@example.com"));
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_with_two_ats_is_rejected() {
        assert!(EmailAddress::new("a@b@example.com").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn customer_requires_name() {
        assert!(CustomerAttributes::new("ada@example.com", "  ").is_err());
    }

    #[test]
    fn with_changes_keeps_unspecified_fields() {
        let attributes = CustomerAttributes::new("ada@example.com", "Ada")
            .unwrap_or_else(|_| unreachable!());
        let changed = attributes
            .with_changes(None, Some("Ada L.".to_owned()))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(changed.email().as_str(), "ada@example.com");
        assert_eq!(changed.display_name().as_str(), "Ada L.");
    }
}
