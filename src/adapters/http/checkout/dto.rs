//! HTTP DTOs for checkout endpoints.
//!
//! Request bodies deserialize straight into [`CheckoutRequest`]; responses
//! are the view types shared with the client port, built here from handler
//! results.

use serde::Serialize;

use crate::application::handlers::checkout::{
    CreateCardPaymentResult, CreatePixPaymentResult, GetPaymentStatusResult,
    HandleGatewayWebhookResult,
};
use crate::domain::billing::Plan;
use crate::ports::{CardPaymentView, CardVerdict, PaymentStatusView, PixPaymentView, PlanView};

impl From<&Plan> for PlanView {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.as_i64(),
            name: plan.name.clone(),
            price: plan.price.as_decimal(),
            currency: plan.price.currency().to_string(),
            interval: plan.interval,
        }
    }
}

impl From<CreatePixPaymentResult> for PixPaymentView {
    fn from(result: CreatePixPaymentResult) -> Self {
        let payment = result.payment;
        Self {
            payment_id: payment.id.as_i64(),
            transaction_id: payment.transaction_id.to_string(),
            status: payment.status,
            pix_qr_code: payment.pix.qr_code,
            pix_qr_code_url: payment.pix.qr_code_url,
            expires_at: payment.pix.expires_at,
            amount: payment.amount.as_decimal(),
            currency: payment.amount.currency().to_string(),
            plan: PlanView::from(&result.plan),
        }
    }
}

impl From<CreateCardPaymentResult> for CardPaymentView {
    fn from(result: CreateCardPaymentResult) -> Self {
        let payment = result.payment;
        Self {
            payment_id: payment.id.as_i64(),
            transaction_id: payment.transaction_id.to_string(),
            status: CardVerdict::from_status(payment.status),
            subscription_id: result.subscription.map(|s| s.id.as_i64()),
            acquirer_message: payment.acquirer.message,
        }
    }
}

impl From<GetPaymentStatusResult> for PaymentStatusView {
    fn from(result: GetPaymentStatusResult) -> Self {
        let payment = result.payment;
        Self {
            payment_id: payment.id.as_i64(),
            transaction_id: payment.transaction_id.to_string(),
            status: payment.status,
            payment_method: payment.method,
            pix_qr_code: payment.pix.qr_code,
            pix_qr_code_url: payment.pix.qr_code_url,
            expires_at: payment.pix.expires_at,
            acquirer_message: payment.acquirer.message,
            subscription_id: result.subscription.map(|s| s.id.as_i64()),
        }
    }
}

/// Body of every 200 from the webhook endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    /// `applied`, `unknown_transaction` or `ignored`.
    pub outcome: &'static str,
}

impl From<&HandleGatewayWebhookResult> for WebhookAckResponse {
    fn from(result: &HandleGatewayWebhookResult) -> Self {
        let outcome = match result {
            HandleGatewayWebhookResult::Applied { .. } => "applied",
            HandleGatewayWebhookResult::UnknownTransaction { .. } => "unknown_transaction",
            HandleGatewayWebhookResult::Ignored { .. } => "ignored",
        };
        Self {
            received: true,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{BilledEntity, BillingInterval};
    use crate::domain::foundation::{CustomerId, Money, PaymentId, PlanId, Timestamp};
    use crate::domain::payment::{
        AcquirerResponse, Payment, PaymentAttempt, PaymentMethod, PaymentStatus, PixDetails,
    };

    fn plan() -> Plan {
        Plan::new(
            PlanId::new(1).unwrap(),
            "Pro",
            Money::brl(9990).unwrap(),
            BillingInterval::Monthly,
        )
    }

    fn payment(method: PaymentMethod) -> Payment {
        Payment::open(
            PaymentId::new(4).unwrap(),
            PaymentAttempt {
                billed_entity: BilledEntity::Customer(CustomerId::new(7).unwrap()),
                plan_id: PlanId::new(1).unwrap(),
                amount: Money::brl(9990).unwrap(),
                method,
            },
            Timestamp::now(),
        )
    }

    #[test]
    fn pix_view_renders_decimal_amount_and_qr() {
        let mut payment = payment(PaymentMethod::Pix);
        payment.pix = PixDetails {
            qr_code: Some("000201".into()),
            qr_code_url: Some("https://qr".into()),
            expires_at: Some(Timestamp::now()),
        };
        let view = PixPaymentView::from(CreatePixPaymentResult {
            payment,
            plan: plan(),
        });

        assert_eq!(view.amount, 99.9);
        assert_eq!(view.currency, "BRL");
        assert_eq!(view.pix_qr_code.as_deref(), Some("000201"));
        assert!(view.expires_at.is_some());
        assert_eq!(view.plan.interval, BillingInterval::Monthly);
    }

    #[test]
    fn failed_card_view_has_no_subscription() {
        let mut payment = payment(PaymentMethod::CreditCard);
        payment.settle(PaymentStatus::Failed, Timestamp::now());
        payment.acquirer = AcquirerResponse {
            code: Some("1011".into()),
            message: Some("Cartão recusado".into()),
        };
        let view = CardPaymentView::from(CreateCardPaymentResult {
            payment,
            subscription: None,
        });

        assert_eq!(view.status, CardVerdict::Failed);
        assert!(view.subscription_id.is_none());
        assert_eq!(view.acquirer_message.as_deref(), Some("Cartão recusado"));
    }

    #[test]
    fn webhook_ack_names_outcome() {
        let ack = WebhookAckResponse::from(&HandleGatewayWebhookResult::Ignored {
            event_type: "customer.created".into(),
        });
        assert!(ack.received);
        assert_eq!(ack.outcome, "ignored");
    }
}
