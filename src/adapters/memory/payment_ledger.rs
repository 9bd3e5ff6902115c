use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, PaymentId, Timestamp, TransactionId};
use crate::domain::payment::{
    GatewayRefs, Payment, PaymentAttempt, PaymentStatus, PaymentUpdate, StatusChange,
};
use crate::ports::{payment_not_found, PaymentLedger};

use super::lock;

#[derive(Default)]
struct LedgerState {
    next_id: i64,
    payments: BTreeMap<PaymentId, Payment>,
}

/// Payment ledger backed by a map.
#[derive(Default)]
pub struct InMemoryPaymentLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored payment, ordered by id.
    pub fn all(&self) -> Vec<Payment> {
        lock(&self.state, "InMemoryPaymentLedger")
            .map(|state| state.payments.values().cloned().collect())
            .unwrap_or_default()
    }

    fn modify<F>(&self, id: PaymentId, apply: F) -> Result<PaymentUpdate, DomainError>
    where
        F: FnOnce(&mut Payment) -> Result<StatusChange, DomainError>,
    {
        let mut state = lock(&self.state, "InMemoryPaymentLedger")?;
        let stored = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| payment_not_found(id))?;

        // Work on a copy so a rejected update leaves the row untouched.
        let mut candidate = stored.clone();
        let change = apply(&mut candidate)?;
        *stored = candidate.clone();
        Ok(PaymentUpdate {
            payment: candidate,
            change,
        })
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn create(&self, attempt: PaymentAttempt) -> Result<Payment, DomainError> {
        let mut state = lock(&self.state, "InMemoryPaymentLedger")?;
        state.next_id += 1;
        let id = PaymentId::from_db(state.next_id);
        let payment = Payment::open(id, attempt, Timestamp::now());
        state.payments.insert(id, payment.clone());
        Ok(payment)
    }

    async fn attach_gateway_refs(
        &self,
        id: PaymentId,
        refs: GatewayRefs,
    ) -> Result<PaymentUpdate, DomainError> {
        self.modify(id, |payment| {
            payment.attach_gateway_refs(refs, Timestamp::now())
        })
    }

    async fn set_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<PaymentUpdate, DomainError> {
        self.modify(id, |payment| Ok(payment.settle(status, Timestamp::now())))
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let state = lock(&self.state, "InMemoryPaymentLedger")?;
        Ok(state.payments.get(&id).cloned())
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<Payment>, DomainError> {
        if transaction_id.is_unassigned() {
            return Ok(None);
        }
        let state = lock(&self.state, "InMemoryPaymentLedger")?;
        Ok(state
            .payments
            .values()
            .find(|p| &p.transaction_id == transaction_id)
            .cloned())
    }
}
