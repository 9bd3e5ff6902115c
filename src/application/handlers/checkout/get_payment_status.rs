//! GetPaymentStatusHandler - Poll reconciler.
//!
//! Re-reads gateway truth for a pending payment and settles it exactly the
//! way the webhook path does, so whichever path commits first wins and the
//! other observes a terminal row.

use std::sync::Arc;

use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::TransactionId;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::subscription::Subscription;
use crate::ports::{PaymentGateway, PaymentLedger};

use super::SubscriptionActivator;

/// Query for the current state of a checkout.
#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub transaction_id: String,
}

#[derive(Debug, Clone)]
pub struct GetPaymentStatusResult {
    pub payment: Payment,
    /// Present once the payment completed and activation ran.
    pub subscription: Option<Subscription>,
}

pub struct GetPaymentStatusHandler {
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
    activator: Arc<SubscriptionActivator>,
}

impl GetPaymentStatusHandler {
    pub fn new(
        ledger: Arc<dyn PaymentLedger>,
        gateway: Arc<dyn PaymentGateway>,
        activator: Arc<SubscriptionActivator>,
    ) -> Self {
        Self {
            ledger,
            gateway,
            activator,
        }
    }

    pub async fn handle(
        &self,
        query: GetPaymentStatusQuery,
    ) -> Result<GetPaymentStatusResult, CheckoutError> {
        // 1. Local row
        let transaction_id = TransactionId::new(query.transaction_id)?;
        let mut payment = self
            .ledger
            .find_by_transaction_id(&transaction_id)
            .await?
            .ok_or_else(|| CheckoutError::not_found("Transaction", &transaction_id))?;

        // 2. Gateway truth, only while the row can still move
        if !payment.is_terminal() {
            let transaction = self.gateway.get_transaction(&transaction_id).await?;
            let mapped = transaction.charge_status().to_payment_status();
            if mapped != payment.status {
                let update = self
                    .ledger
                    .attach_gateway_refs(payment.id, transaction.to_refs().with_status(mapped))
                    .await?;
                if update.change.is_transition() {
                    tracing::info!(
                        payment_id = %update.payment.id,
                        transaction_id = %transaction_id,
                        status = update.payment.status.as_str(),
                        "Payment settled by status poll"
                    );
                }
                payment = update.payment;
            }
        }

        // 3. Completed payments always pass through the idempotent activator
        let subscription = if payment.status == PaymentStatus::Completed {
            Some(self.activator.activate(&payment).await?.subscription)
        } else {
            None
        };

        Ok(GetPaymentStatusResult {
            payment,
            subscription,
        })
    }
}
