use std::fmt::{Display, Formatter};

use paygate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

const PERCENTAGE_SCALE: u32 = 10_000;
const MAX_PERCENTAGE_UNITS: u32 = 100 * PERCENTAGE_SCALE;

/// Tax percentage between 0 and 100 with at most four fractional digits.
///
/// Stored as ten-thousandths of a percent so equality and storage are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a validated percentage from a decimal value.
    pub fn from_decimal(value: f64) -> AppResult<Self> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(AppError::Validation(
                "percentage must be between 0 and 100".to_owned(),
            ));
        }

        let scaled = value * f64::from(PERCENTAGE_SCALE);
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(AppError::Validation(
                "percentage must have at most 4 decimal places".to_owned(),
            ));
        }

        // `rounded` is within 0..=1_000_000 after the range check above.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let units = rounded as u32;
        Ok(Self(units.min(MAX_PERCENTAGE_UNITS)))
    }

    /// Returns the decimal value.
    #[must_use]
    pub fn as_decimal(&self) -> f64 {
        f64::from(self.0) / f64::from(PERCENTAGE_SCALE)
    }
}

impl TryFrom<f64> for Percentage {
    type Error = AppError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Percentage> for f64 {
    fn from(value: Percentage) -> Self {
        value.as_decimal()
    }
}

impl Display for Percentage {
    /// Formats without trailing zeros, as providers expect (`8.25`, `20`).
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / PERCENTAGE_SCALE;
        let fraction = self.0 % PERCENTAGE_SCALE;
        if fraction == 0 {
            return write!(formatter, "{whole}");
        }

        let digits = format!("{fraction:04}");
        write!(formatter, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

/// Tax rate attributes mirrored from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRateAttributes {
    display_name: NonEmptyString,
    percentage: Percentage,
    inclusive: bool,
    active: bool,
    jurisdiction: Option<String>,
}

impl TaxRateAttributes {
    /// Creates validated tax rate attributes.
    pub fn new(
        display_name: impl Into<String>,
        percentage: f64,
        inclusive: bool,
        jurisdiction: Option<String>,
    ) -> AppResult<Self> {
        let display_name = display_name.into();
        if display_name.chars().count() > 50 {
            return Err(AppError::Validation(
                "tax rate display name must not exceed 50 characters".to_owned(),
            ));
        }

        Ok(Self {
            display_name: NonEmptyString::new(display_name.trim())?,
            percentage: Percentage::from_decimal(percentage)?,
            inclusive,
            active: true,
            jurisdiction: jurisdiction
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
        })
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the tax percentage.
    #[must_use]
    pub fn percentage(&self) -> Percentage {
        self.percentage
    }

    /// Returns whether the tax is included in prices.
    #[must_use]
    pub fn inclusive(&self) -> bool {
        self.inclusive
    }

    /// Returns whether the rate can be applied to new invoices.
    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }

    /// Returns the optional jurisdiction label.
    #[must_use]
    pub fn jurisdiction(&self) -> Option<&str> {
        self.jurisdiction.as_deref()
    }

    /// Returns attributes with the mutable fields replaced.
    pub fn with_changes(&self, display_name: Option<String>, active: Option<bool>) -> AppResult<Self> {
        let display_name = match display_name {
            Some(value) => NonEmptyString::new(value.trim())?,
            None => self.display_name.clone(),
        };

        Ok(Self {
            display_name,
            active: active.unwrap_or(self.active),
            ..self.clone()
        })
    }

    /// Returns attributes marked inactive.
    #[must_use]
    pub fn deactivated(&self) -> Self {
        Self {
            active: false,
            ..self.clone()
        }
    }
}
