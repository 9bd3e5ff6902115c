//! SubscriptionActivator - Idempotent promotion of a completed payment.
//!
//! Shared by the card flow and both reconcilers. Serialisation per
//! (entity, plan) is the repository's job; this type only resolves the
//! plan's billing interval and reports the outcome.

use std::sync::Arc;

use crate::domain::checkout::CheckoutError;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::subscription::{Activation, ActivationRequest};
use crate::ports::{CatalogReader, SubscriptionRepository};

pub struct SubscriptionActivator {
    subscriptions: Arc<dyn SubscriptionRepository>,
    catalog: Arc<dyn CatalogReader>,
}

impl SubscriptionActivator {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Self {
        Self {
            subscriptions,
            catalog,
        }
    }

    /// Ensures exactly one active subscription exists for the payment's
    /// (entity, plan). Safe to call any number of times.
    pub async fn activate(&self, payment: &Payment) -> Result<Activation, CheckoutError> {
        // 1. Only completed payments activate
        if payment.status != PaymentStatus::Completed {
            return Err(CheckoutError::infrastructure(format!(
                "Payment {} is {}, not completed",
                payment.id,
                payment.status.as_str()
            )));
        }

        // 2. Resolve the billing interval
        let plan = self
            .catalog
            .find_plan(payment.plan_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Plan", payment.plan_id))?;

        // 3. Activate under the repository's serialisation
        let activation = self
            .subscriptions
            .activate(ActivationRequest::for_payment(payment, plan.interval))
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            subscription_id = %activation.subscription.id,
            billed_entity = %payment.billed_entity,
            plan_id = %payment.plan_id,
            outcome = ?activation.outcome,
            "Subscription activated"
        );

        Ok(activation)
    }
}
