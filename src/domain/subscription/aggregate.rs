//! Subscription aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::billing::{BilledEntity, BillingInterval};
use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp};
use crate::domain::payment::PaymentMethod;

use super::SubscriptionStatus;

/// A billing period `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl BillingPeriod {
    /// First period for `interval`, anchored at `start`.
    pub fn starting_at(start: Timestamp, interval: BillingInterval) -> Self {
        Self {
            start,
            end: interval.period_end(start),
        }
    }
}

/// Row to insert for a brand-new subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub billed_entity: BilledEntity,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub period: BillingPeriod,
    pub auto_renew: bool,
    pub is_trial: bool,
    pub payment_method: Option<PaymentMethod>,
    pub gateway_customer_id: Option<String>,
    pub gateway_subscription_id: Option<String>,
    pub gateway_card_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub billed_entity: BilledEntity,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub auto_renew: bool,
    pub is_trial: bool,
    pub payment_method: Option<PaymentMethod>,
    pub gateway_customer_id: Option<String>,
    pub gateway_subscription_id: Option<String>,
    pub gateway_card_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Materialises an inserted row.
    pub fn from_new(id: SubscriptionId, new: NewSubscription, now: Timestamp) -> Self {
        Self {
            id,
            billed_entity: new.billed_entity,
            plan_id: new.plan_id,
            status: new.status,
            current_period_start: new.period.start,
            current_period_end: new.period.end,
            auto_renew: new.auto_renew,
            is_trial: new.is_trial,
            payment_method: new.payment_method,
            gateway_customer_id: new.gateway_customer_id,
            gateway_subscription_id: new.gateway_subscription_id,
            gateway_card_id: new.gateway_card_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn period(&self) -> BillingPeriod {
        BillingPeriod {
            start: self.current_period_start,
            end: self.current_period_end,
        }
    }

    /// Promotes a pending row to active with a fresh period.
    ///
    /// Returns false when the row was already active (nothing to do).
    pub fn promote(&mut self, period: BillingPeriod, now: Timestamp) -> bool {
        if self.status != SubscriptionStatus::Pending {
            return false;
        }
        self.status = SubscriptionStatus::Active;
        self.current_period_start = period.start;
        self.current_period_end = period.end;
        self.updated_at = now;
        true
    }
}
