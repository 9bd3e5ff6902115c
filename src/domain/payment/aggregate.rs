//! Payment aggregate.
//!
//! # Invariants
//!
//! - `transaction_id` goes from unassigned to a value once and never changes
//! - `status` moves pending -> completed or pending -> failed only
//! - a terminal status is immutable; repeated settlement is a no-op

use serde::{Deserialize, Serialize};

use crate::domain::billing::BilledEntity;
use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PaymentId, PlanId, StateMachine, Timestamp, TransactionId,
};

use super::{AcquirerResponse, CardDetails, GatewayRefs, PaymentMethod, PaymentStatus, PixDetails};

/// What the orchestrator knows before the gateway is contacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub billed_entity: BilledEntity,
    pub plan_id: PlanId,
    pub amount: Money,
    pub method: PaymentMethod,
}

/// One purchase attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub transaction_id: TransactionId,
    pub billed_entity: BilledEntity,
    pub plan_id: PlanId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,

    pub charge_id: Option<String>,
    pub gateway_customer_id: Option<String>,
    pub pix: PixDetails,
    pub card: CardDetails,
    pub acquirer: AcquirerResponse,
    pub fee_cents: Option<i64>,
    pub metadata: Option<serde_json::Value>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Set when the payment reaches `completed`.
    pub paid_at: Option<Timestamp>,
}

/// Outcome of asking a payment to take a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Transitioned {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    /// Already terminal, or the requested status was not a move.
    Unchanged,
}

impl StatusChange {
    pub fn is_transition(&self) -> bool {
        matches!(self, StatusChange::Transitioned { .. })
    }
}

/// A ledger write result: the stored row plus what the write did to it.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub payment: Payment,
    pub change: StatusChange,
}

impl Payment {
    /// Opens a pending payment with no gateway reference.
    pub fn open(id: PaymentId, attempt: PaymentAttempt, now: Timestamp) -> Self {
        Self {
            id,
            transaction_id: TransactionId::unassigned(),
            billed_entity: attempt.billed_entity,
            plan_id: attempt.plan_id,
            amount: attempt.amount,
            method: attempt.method,
            status: PaymentStatus::Pending,
            charge_id: None,
            gateway_customer_id: None,
            pix: PixDetails::default(),
            card: CardDetails::default(),
            acquirer: AcquirerResponse::default(),
            fee_cents: None,
            metadata: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Moves to `target` if that is a legal transition.
    ///
    /// Terminal payments and pending-to-pending requests come back as
    /// `Unchanged`; neither is an error.
    pub fn settle(&mut self, target: PaymentStatus, now: Timestamp) -> StatusChange {
        if !self.status.can_transition_to(&target) {
            return StatusChange::Unchanged;
        }
        let from = self.status;
        self.status = target;
        self.updated_at = now;
        if target == PaymentStatus::Completed {
            self.paid_at = Some(now);
        }
        StatusChange::Transitioned { from, to: target }
    }

    /// Merges gateway fields into the payment.
    ///
    /// The transaction id may be set once; re-sending the same id is
    /// accepted, a different one is rejected. A status in `refs` is applied
    /// only when it is terminal.
    pub fn attach_gateway_refs(
        &mut self,
        refs: GatewayRefs,
        now: Timestamp,
    ) -> Result<StatusChange, DomainError> {
        if let Some(transaction_id) = refs.transaction_id {
            if self.transaction_id.is_unassigned() {
                self.transaction_id = transaction_id;
            } else if self.transaction_id != transaction_id {
                return Err(DomainError::new(
                    ErrorCode::TransactionIdAlreadySet,
                    format!(
                        "Payment {} already bound to transaction {}",
                        self.id, self.transaction_id
                    ),
                )
                .with_subject(transaction_id));
            }
        }

        if refs.charge_id.is_some() {
            self.charge_id = refs.charge_id;
        }
        if refs.gateway_customer_id.is_some() {
            self.gateway_customer_id = refs.gateway_customer_id;
        }
        if let Some(pix) = refs.pix {
            self.pix.merge(pix);
        }
        if let Some(card) = refs.card {
            self.card.merge(card);
        }
        if let Some(acquirer) = refs.acquirer {
            self.acquirer.merge(acquirer);
        }
        if refs.fee_cents.is_some() {
            self.fee_cents = refs.fee_cents;
        }
        if refs.metadata.is_some() {
            self.metadata = refs.metadata;
        }
        self.updated_at = now;

        Ok(match refs.status {
            Some(status) if status.is_terminal() => self.settle(status, now),
            _ => StatusChange::Unchanged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CustomerId;
    use proptest::prelude::*;

    fn pending_payment() -> Payment {
        Payment::open(
            PaymentId::new(1).unwrap(),
            PaymentAttempt {
                billed_entity: BilledEntity::Customer(CustomerId::new(7).unwrap()),
                plan_id: PlanId::new(1).unwrap(),
                amount: Money::brl(9990).unwrap(),
                method: PaymentMethod::Pix,
            },
            Timestamp::now(),
        )
    }

    fn tx(id: &str) -> Option<TransactionId> {
        Some(TransactionId::new(id).unwrap())
    }

    #[test]
    fn open_payment_is_pending_without_transaction() {
        let payment = pending_payment();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.transaction_id.is_unassigned());
        assert!(payment.paid_at.is_none());
    }

    #[test]
    fn settle_to_completed_records_paid_at() {
        let mut payment = pending_payment();
        let change = payment.settle(PaymentStatus::Completed, Timestamp::now());
        assert_eq!(
            change,
            StatusChange::Transitioned {
                from: PaymentStatus::Pending,
                to: PaymentStatus::Completed
            }
        );
        assert!(payment.paid_at.is_some());
    }

    #[test]
    fn settle_on_terminal_payment_is_noop() {
        let mut payment = pending_payment();
        payment.settle(PaymentStatus::Failed, Timestamp::now());
        let change = payment.settle(PaymentStatus::Completed, Timestamp::now());
        assert_eq!(change, StatusChange::Unchanged);
        assert_eq!(payment.status, PaymentStatus::Failed);
    }

    #[test]
    fn attach_sets_transaction_id_once() {
        let mut payment = pending_payment();
        let refs = GatewayRefs {
            transaction_id: tx("or_1"),
            ..Default::default()
        };
        payment.attach_gateway_refs(refs.clone(), Timestamp::now()).unwrap();
        payment.attach_gateway_refs(refs, Timestamp::now()).unwrap();
        assert_eq!(payment.transaction_id.as_str(), "or_1");
    }

    #[test]
    fn attach_rejects_different_transaction_id() {
        let mut payment = pending_payment();
        payment
            .attach_gateway_refs(
                GatewayRefs {
                    transaction_id: tx("or_1"),
                    ..Default::default()
                },
                Timestamp::now(),
            )
            .unwrap();
        let err = payment
            .attach_gateway_refs(
                GatewayRefs {
                    transaction_id: tx("or_2"),
                    ..Default::default()
                },
                Timestamp::now(),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TransactionIdAlreadySet);
        assert_eq!(payment.transaction_id.as_str(), "or_1");
    }

    #[test]
    fn attach_with_pending_status_leaves_payment_pending() {
        let mut payment = pending_payment();
        let change = payment
            .attach_gateway_refs(
                GatewayRefs {
                    transaction_id: tx("or_1"),
                    pix: Some(PixDetails {
                        qr_code: Some("000201".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
                .with_status(PaymentStatus::Pending),
                Timestamp::now(),
            )
            .unwrap();
        assert_eq!(change, StatusChange::Unchanged);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.pix.qr_code.as_deref(), Some("000201"));
    }

    #[test]
    fn attach_with_terminal_status_settles() {
        let mut payment = pending_payment();
        let change = payment
            .attach_gateway_refs(
                GatewayRefs::default().with_status(PaymentStatus::Failed),
                Timestamp::now(),
            )
            .unwrap();
        assert!(change.is_transition());
        assert_eq!(payment.status, PaymentStatus::Failed);
    }

    fn any_status() -> impl Strategy<Value = PaymentStatus> {
        prop_oneof![
            Just(PaymentStatus::Pending),
            Just(PaymentStatus::Completed),
            Just(PaymentStatus::Failed),
        ]
    }

    proptest! {
        #[test]
        fn terminal_status_never_changes(
            first in prop_oneof![Just(PaymentStatus::Completed), Just(PaymentStatus::Failed)],
            later in proptest::collection::vec(any_status(), 0..16),
        ) {
            let mut payment = pending_payment();
            payment.settle(first, Timestamp::now());
            for status in later {
                let change = payment.settle(status, Timestamp::now());
                prop_assert_eq!(change, StatusChange::Unchanged);
                prop_assert_eq!(payment.status, first);
            }
        }

        #[test]
        fn at_most_one_transition_per_payment(
            sequence in proptest::collection::vec(any_status(), 1..16),
        ) {
            let mut payment = pending_payment();
            let transitions = sequence
                .into_iter()
                .map(|status| payment.settle(status, Timestamp::now()))
                .filter(StatusChange::is_transition)
                .count();
            prop_assert!(transitions <= 1);
        }
    }
}
