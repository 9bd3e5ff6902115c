//! Checkout error taxonomy.

use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced by the checkout, status and activation operations.
#[derive(Debug, Clone)]
pub enum CheckoutError {
    /// Missing or malformed request field. Nothing was written.
    Validation(ValidationError),
    /// Plan, billed entity or payment absent.
    NotFound { resource: &'static str, id: String },
    /// The gateway call failed or returned an unusable shape.
    Gateway { message: String },
    /// Storage or other internal failure.
    Infrastructure { message: String },
}

impl CheckoutError {
    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        CheckoutError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        CheckoutError::Gateway {
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CheckoutError::Infrastructure {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "VALIDATION_ERROR",
            CheckoutError::NotFound { .. } => "NOT_FOUND",
            CheckoutError::Gateway { .. } => "GATEWAY_ERROR",
            CheckoutError::Infrastructure { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckoutError::Validation(err) => err.to_string(),
            CheckoutError::NotFound { resource, id } => format!("{} {} not found", resource, id),
            CheckoutError::Gateway { message } => format!("Payment gateway error: {}", message),
            CheckoutError::Infrastructure { message } => message.clone(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Gateway { .. } | CheckoutError::Infrastructure { .. }
        )
    }
}

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for CheckoutError {}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Validation(err)
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        let resource = match err.code {
            ErrorCode::PaymentNotFound => Some("Payment"),
            ErrorCode::SubscriptionNotFound => Some("Subscription"),
            ErrorCode::PlanNotFound => Some("Plan"),
            ErrorCode::BilledEntityNotFound => Some("Billed entity"),
            _ => None,
        };
        match resource {
            Some(resource) => CheckoutError::NotFound {
                resource,
                id: err.subject.unwrap_or_default(),
            },
            None => CheckoutError::Infrastructure {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_resource() {
        let err = CheckoutError::not_found("Plan", 99);
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.message(), "Plan 99 not found");
    }

    #[test]
    fn domain_not_found_maps_to_not_found() {
        let err: CheckoutError =
            DomainError::new(ErrorCode::PaymentNotFound, "missing").with_subject(4).into();
        assert!(matches!(err, CheckoutError::NotFound { resource: "Payment", ref id } if id == "4"));
    }

    #[test]
    fn other_domain_errors_are_infrastructure() {
        let err: CheckoutError = DomainError::database("pool timed out").into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.is_retryable());
    }

    #[test]
    fn validation_is_not_retryable() {
        let err: CheckoutError = ValidationError::empty_field("plan_id").into();
        assert!(!err.is_retryable());
        assert_eq!(err.message(), "Field 'plan_id' cannot be empty");
    }
}
