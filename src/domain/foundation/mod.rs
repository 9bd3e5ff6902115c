//! Foundation module - Shared domain primitives.
//!
//! Identifiers, money, time and error types that the payment and
//! subscription modules are built from.

mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CompanyId, CustomerId, PaymentId, PlanId, SubscriptionId, TransactionId};
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
