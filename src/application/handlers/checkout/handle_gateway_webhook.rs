//! HandleGatewayWebhookHandler - Webhook reconciler.
//!
//! Verifies and normalises a gateway notification, settles the matching
//! payment and activates the subscription when the payment is completed.
//! Redeliveries are harmless: the ledger ignores status changes on terminal
//! rows and activation is idempotent.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, PaymentId, SubscriptionId, TransactionId};
use crate::domain::gateway::{ChargeReference, GatewayEvent, WebhookError};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::{PaymentGateway, PaymentLedger};

use super::SubscriptionActivator;

/// Command to handle a gateway webhook.
#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,
    /// Value of the signature header, empty when absent.
    pub signature: String,
}

/// Result of webhook processing. Every variant is acknowledged with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleGatewayWebhookResult {
    /// The event was applied to a local payment.
    Applied {
        payment_id: PaymentId,
        status: PaymentStatus,
        subscription_id: Option<SubscriptionId>,
    },
    /// No local payment matches the event.
    UnknownTransaction { transaction_id: TransactionId },
    /// Event type this engine does not act on.
    Ignored { event_type: String },
}

pub struct HandleGatewayWebhookHandler {
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
    activator: Arc<SubscriptionActivator>,
}

impl HandleGatewayWebhookHandler {
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
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<HandleGatewayWebhookResult, WebhookError> {
        // 1. Authenticate the body before reading it
        if !self.gateway.validate_webhook(&cmd.signature, &cmd.payload) {
            tracing::warn!("Rejected webhook with invalid signature");
            return Err(WebhookError::InvalidSignature);
        }

        // 2. Normalise
        let event = self
            .gateway
            .process_webhook(&cmd.payload)
            .map_err(|e| WebhookError::ParseError(e.message))?;
        let Some(reference) = event.reference().cloned() else {
            let event_type = match &event {
                GatewayEvent::Unknown { event_type } => event_type.clone(),
                _ => String::new(),
            };
            return Ok(HandleGatewayWebhookResult::Ignored { event_type });
        };

        // 3. Locate the payment
        let payment = match self.locate(&reference).await.map_err(database)? {
            Some(payment) => payment,
            None => {
                tracing::warn!(
                    transaction_id = %reference.transaction_id,
                    payment_id = ?reference.payment_id,
                    "Webhook for unknown transaction acknowledged"
                );
                return Ok(HandleGatewayWebhookResult::UnknownTransaction {
                    transaction_id: reference.transaction_id,
                });
            }
        };

        // 4. Merge and settle; terminal rows stay as they are
        let mut refs = event.to_refs();
        refs.metadata = serde_json::from_slice(&cmd.payload).ok();
        let update = self
            .ledger
            .attach_gateway_refs(payment.id, refs)
            .await
            .map_err(database)?;
        if update.change.is_transition() {
            tracing::info!(
                payment_id = %update.payment.id,
                transaction_id = %reference.transaction_id,
                status = update.payment.status.as_str(),
                "Payment settled by webhook"
            );
        }

        // 5. Activate whenever the stored payment is completed
        let subscription_id = if update.payment.status == PaymentStatus::Completed {
            let activation = self
                .activator
                .activate(&update.payment)
                .await
                .map_err(|e| WebhookError::Database(e.message()))?;
            Some(activation.subscription.id)
        } else {
            None
        };

        Ok(HandleGatewayWebhookResult::Applied {
            payment_id: update.payment.id,
            status: update.payment.status,
            subscription_id,
        })
    }

    /// By transaction id, then by the payment id echoed in the order
    /// metadata when the row was never bound to this transaction.
    async fn locate(&self, reference: &ChargeReference) -> Result<Option<Payment>, DomainError> {
        if let Some(payment) = self
            .ledger
            .find_by_transaction_id(&reference.transaction_id)
            .await?
        {
            return Ok(Some(payment));
        }

        let Some(payment_id) = reference.payment_id else {
            return Ok(None);
        };
        Ok(self.ledger.find_by_id(payment_id).await?.filter(|payment| {
            payment.transaction_id.is_unassigned()
                || payment.transaction_id == reference.transaction_id
        }))
    }
}

fn database(err: DomainError) -> WebhookError {
    tracing::error!(error = %err, "Webhook could not be applied");
    WebhookError::Database(err.to_string())
}
