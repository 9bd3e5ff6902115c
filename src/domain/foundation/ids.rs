//! Strongly-typed identifier value objects.
//!
//! Local records use database-assigned integer keys; the gateway assigns
//! opaque string identifiers to orders and charges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw key, rejecting non-positive values.
            pub fn new(value: i64) -> Result<Self, ValidationError> {
                if value <= 0 {
                    return Err(ValidationError::out_of_range($field, 1, i64::MAX, value));
                }
                Ok(Self(value))
            }

            /// Wraps a key read back from storage.
            pub(crate) fn from_db(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw key.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<i64>().map_err(|_| {
                    ValidationError::invalid_format($field, format!("'{}' is not an integer id", s))
                })?;
                Self::new(value)
            }
        }
    };
}

integer_id!(
    /// Local identifier of a payment attempt.
    PaymentId,
    "payment_id"
);
integer_id!(
    /// Local identifier of a subscription row.
    SubscriptionId,
    "subscription_id"
);
integer_id!(
    /// Identifier of a catalog plan.
    PlanId,
    "plan_id"
);
integer_id!(
    /// Identifier of a company billed as a tenant.
    CompanyId,
    "company_id"
);
integer_id!(
    /// Identifier of an individual customer.
    CustomerId,
    "customer_id"
);

/// Gateway-assigned order identifier (`or_...` for Pagar.me).
///
/// Empty until the gateway accepts the charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Creates a transaction id, rejecting blank values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("transaction_id"));
        }
        Ok(Self(value))
    }

    /// The not-yet-assigned transaction id.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// True when no gateway id has been recorded.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_id_rejects_zero_and_negative() {
        assert!(PlanId::new(0).is_err());
        assert!(CustomerId::new(-3).is_err());
        assert_eq!(PlanId::new(1).unwrap().as_i64(), 1);
    }

    #[test]
    fn integer_id_parses_from_string() {
        let id: PaymentId = "42".parse().unwrap();
        assert_eq!(id.as_i64(), 42);
        assert!("abc".parse::<PaymentId>().is_err());
    }

    #[test]
    fn integer_id_parse_error_names_field() {
        let err = "x".parse::<CompanyId>().unwrap_err();
        assert_eq!(err.field(), "company_id");
    }

    #[test]
    fn integer_id_serializes_as_number() {
        let id = SubscriptionId::new(9).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
    }

    #[test]
    fn transaction_id_rejects_blank() {
        assert!(TransactionId::new("  ").is_err());
        assert_eq!(TransactionId::new("or_123").unwrap().as_str(), "or_123");
    }

    #[test]
    fn unassigned_transaction_id_is_empty() {
        let id = TransactionId::unassigned();
        assert!(id.is_unassigned());
        assert_eq!(id.to_string(), "");
    }
}
