//! CreateCardPaymentHandler - Charges a card and activates on approval.

use std::sync::Arc;

use crate::domain::checkout::{CheckoutError, CheckoutRequest, PaymentInstrument};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::domain::subscription::Subscription;
use crate::ports::{CardChargeRequest, CatalogReader, PaymentGateway, PaymentLedger};

use super::payment_intent::open_intent;
use super::SubscriptionActivator;

/// Command to start a card checkout.
#[derive(Debug, Clone)]
pub struct CreateCardPaymentCommand {
    pub request: CheckoutRequest,
}

/// The settled payment and, when approved, its subscription.
#[derive(Debug, Clone)]
pub struct CreateCardPaymentResult {
    pub payment: Payment,
    pub subscription: Option<Subscription>,
}

impl CreateCardPaymentResult {
    pub fn is_approved(&self) -> bool {
        self.payment.status == PaymentStatus::Completed
    }
}

/// Handler for card checkouts.
///
/// The card charge is synchronous, so the verdict is recorded and the
/// subscription activated before responding.
pub struct CreateCardPaymentHandler {
    catalog: Arc<dyn CatalogReader>,
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
    activator: Arc<SubscriptionActivator>,
}

impl CreateCardPaymentHandler {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        ledger: Arc<dyn PaymentLedger>,
        gateway: Arc<dyn PaymentGateway>,
        activator: Arc<SubscriptionActivator>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            gateway,
            activator,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCardPaymentCommand,
    ) -> Result<CreateCardPaymentResult, CheckoutError> {
        // 1. Validate, resolve and open the pending row
        let intent = open_intent(
            &self.catalog,
            &self.ledger,
            &cmd.request,
            PaymentMethod::CreditCard,
        )
        .await?;
        let (card, billing_address) = match &intent.checkout.instrument {
            PaymentInstrument::Card {
                card,
                billing_address,
            } => (card.clone(), billing_address.clone()),
            PaymentInstrument::Pix { .. } => {
                return Err(CheckoutError::infrastructure(
                    "Card checkout validated without card data",
                ))
            }
        };

        // 2. One gateway call, no retry
        let transaction = self
            .gateway
            .create_card_payment(CardChargeRequest {
                amount: intent.plan.price.clone(),
                description: intent.plan.name.clone(),
                customer: intent.checkout.customer.clone().into(),
                card,
                billing_address,
                metadata: intent.metadata(),
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    payment_id = %intent.payment.id,
                    error = %e,
                    "Card charge failed; payment left pending"
                );
                CheckoutError::from(e)
            })?;

        // 3. Record the verdict; anything not approved is a failure
        let charge_status = transaction.charge_status();
        let verdict = if charge_status.is_approved() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };
        let update = self
            .ledger
            .attach_gateway_refs(intent.payment.id, transaction.to_refs().with_status(verdict))
            .await?;
        let payment = update.payment;

        tracing::info!(
            payment_id = %payment.id,
            transaction_id = %payment.transaction_id,
            charge_status = charge_status.as_str(),
            status = payment.status.as_str(),
            "Card payment settled"
        );

        // 4. Approved cards activate now; the reconcilers heal a failure here
        let subscription = if payment.status == PaymentStatus::Completed {
            match self.activator.activate(&payment).await {
                Ok(activation) => Some(activation.subscription),
                Err(e) => {
                    tracing::error!(
                        payment_id = %payment.id,
                        error = %e,
                        "Activation after approved card charge failed"
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(CreateCardPaymentResult {
            payment,
            subscription,
        })
    }
}
