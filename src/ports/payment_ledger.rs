//! Payment ledger port.
//!
//! Every mutation is a read-modify-write on one payment row that applies the
//! aggregate's own rules (`Payment::attach_gateway_refs`, `Payment::settle`)
//! under a row lock or equivalent, so the webhook and poll reconcilers can
//! race on the same payment safely.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, TransactionId};
use crate::domain::payment::{GatewayRefs, Payment, PaymentAttempt, PaymentStatus, PaymentUpdate};

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Inserts a pending payment with an unassigned transaction id.
    async fn create(&self, attempt: PaymentAttempt) -> Result<Payment, DomainError>;

    /// Merges gateway fields; a terminal status in `refs` settles the payment.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the id is unknown
    /// - `TransactionIdAlreadySet` if a different transaction id is recorded
    async fn attach_gateway_refs(
        &self,
        id: PaymentId,
        refs: GatewayRefs,
    ) -> Result<PaymentUpdate, DomainError>;

    /// Moves the payment to `status` unless it is already terminal.
    ///
    /// Setting a status on a terminal payment is not an error: the stored
    /// row comes back with `StatusChange::Unchanged`.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if the id is unknown
    async fn set_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<PaymentUpdate, DomainError>;

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError>;

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError>;
}

/// Standard not-found error for a payment id.
pub fn payment_not_found(id: PaymentId) -> DomainError {
    DomainError::new(
        ErrorCode::PaymentNotFound,
        format!("Payment {} not found", id),
    )
    .with_subject(id)
}
