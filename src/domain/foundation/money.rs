//! Money value object stored in minor units.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// An amount in the currency's minor unit (centavos for BRL).
///
/// The gateway takes integer minor units; API responses render the
/// decimal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    cents: i64,
    currency: String,
}

impl Money {
    /// Creates a non-negative amount in an ISO 4217 currency.
    pub fn new(cents: i64, currency: impl Into<String>) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::out_of_range("amount", 0, i64::MAX, cents));
        }
        let currency = currency.into().trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("'{}' is not a 3-letter currency code", currency),
            ));
        }
        Ok(Self { cents, currency })
    }

    /// Shorthand for Brazilian reais.
    pub fn brl(cents: i64) -> Result<Self, ValidationError> {
        Self::new(cents, "BRL")
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Decimal value for display (9990 -> 99.9).
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.cents / 100,
            self.cents % 100
        )
    }
}
