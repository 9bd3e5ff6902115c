//! Activation decision shared by every subscription store.
//!
//! Stores call [`decide_activation`] while holding whatever serialises
//! activation for the (entity, plan) pair, then persist the decision.

use crate::domain::billing::{BilledEntity, BillingInterval};
use crate::domain::foundation::{PaymentId, PlanId, Timestamp};
use crate::domain::payment::{Payment, PaymentMethod};

use super::{BillingPeriod, NewSubscription, Subscription, SubscriptionStatus};

/// Everything needed to activate a subscription for a completed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationRequest {
    pub payment_id: PaymentId,
    pub billed_entity: BilledEntity,
    pub plan_id: PlanId,
    pub interval: BillingInterval,
    pub payment_method: PaymentMethod,
    pub gateway_customer_id: Option<String>,
    pub gateway_card_id: Option<String>,
}

impl ActivationRequest {
    pub fn for_payment(payment: &Payment, interval: BillingInterval) -> Self {
        Self {
            payment_id: payment.id,
            billed_entity: payment.billed_entity,
            plan_id: payment.plan_id,
            interval,
            payment_method: payment.method,
            gateway_customer_id: payment.gateway_customer_id.clone(),
            gateway_card_id: payment.card.card_id.clone(),
        }
    }
}

/// What a store must write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationDecision {
    /// An active row already exists. Write nothing.
    KeepActive(Subscription),
    /// A pending row was promoted in place. Update it.
    Promote(Subscription),
    /// No open row exists. Insert this one.
    Create(NewSubscription),
}

/// How an activation ended, for callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Created,
    Promoted,
    AlreadyActive,
}

/// Result of an activation as persisted by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub subscription: Subscription,
    pub outcome: ActivationOutcome,
}

impl ActivationDecision {
    pub fn outcome(&self) -> ActivationOutcome {
        match self {
            ActivationDecision::KeepActive(_) => ActivationOutcome::AlreadyActive,
            ActivationDecision::Promote(_) => ActivationOutcome::Promoted,
            ActivationDecision::Create(_) => ActivationOutcome::Created,
        }
    }
}

/// Chooses between reuse and insert given the current open row, if any.
pub fn decide_activation(
    open: Option<Subscription>,
    request: &ActivationRequest,
    now: Timestamp,
) -> ActivationDecision {
    let period = BillingPeriod::starting_at(now, request.interval);
    match open {
        Some(mut existing) => {
            if existing.promote(period, now) {
                if existing.payment_method.is_none() {
                    existing.payment_method = Some(request.payment_method);
                }
                ActivationDecision::Promote(existing)
            } else {
                ActivationDecision::KeepActive(existing)
            }
        }
        None => ActivationDecision::Create(NewSubscription {
            billed_entity: request.billed_entity,
            plan_id: request.plan_id,
            status: SubscriptionStatus::Active,
            period,
            auto_renew: true,
            is_trial: false,
            payment_method: Some(request.payment_method),
            gateway_customer_id: request.gateway_customer_id.clone(),
            gateway_subscription_id: None,
            gateway_card_id: request.gateway_card_id.clone(),
        }),
    }
}
