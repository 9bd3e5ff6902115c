//! CreatePixPaymentHandler - Opens a PIX payment and returns its QR code.

use std::sync::Arc;

use crate::domain::billing::Plan;
use crate::domain::checkout::{CheckoutError, CheckoutRequest, PaymentInstrument};
use crate::domain::payment::{Payment, PaymentMethod};
use crate::ports::{CatalogReader, PaymentGateway, PaymentLedger, PixChargeRequest};

use super::payment_intent::open_intent;

/// Command to start a PIX checkout.
#[derive(Debug, Clone)]
pub struct CreatePixPaymentCommand {
    pub request: CheckoutRequest,
}

/// The pending payment with its QR data attached.
#[derive(Debug, Clone)]
pub struct CreatePixPaymentResult {
    pub payment: Payment,
    pub plan: Plan,
}

/// Handler for PIX checkouts.
///
/// The payment stays pending; the webhook or the status poll settles it.
pub struct CreatePixPaymentHandler {
    catalog: Arc<dyn CatalogReader>,
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn PaymentGateway>,
    default_expires_in: u32,
}

impl CreatePixPaymentHandler {
    pub fn new(
        catalog: Arc<dyn CatalogReader>,
        ledger: Arc<dyn PaymentLedger>,
        gateway: Arc<dyn PaymentGateway>,
        default_expires_in: u32,
    ) -> Self {
        Self {
            catalog,
            ledger,
            gateway,
            default_expires_in,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePixPaymentCommand,
    ) -> Result<CreatePixPaymentResult, CheckoutError> {
        // 1. Validate, resolve and open the pending row
        let intent =
            open_intent(&self.catalog, &self.ledger, &cmd.request, PaymentMethod::Pix).await?;
        let expires_in = match intent.checkout.instrument {
            PaymentInstrument::Pix { expires_in } => expires_in.unwrap_or(self.default_expires_in),
            PaymentInstrument::Card { .. } => self.default_expires_in,
        };

        // 2. One gateway call, no retry
        let transaction = self
            .gateway
            .create_pix_payment(PixChargeRequest {
                amount: intent.plan.price.clone(),
                description: intent.plan.name.clone(),
                customer: intent.checkout.customer.clone().into(),
                expires_in,
                metadata: intent.metadata(),
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    payment_id = %intent.payment.id,
                    error = %e,
                    "PIX charge failed; payment left pending"
                );
                CheckoutError::from(e)
            })?;

        // 3. Record the QR data; status stays pending
        let update = self
            .ledger
            .attach_gateway_refs(intent.payment.id, transaction.to_refs())
            .await?;

        tracing::info!(
            payment_id = %update.payment.id,
            transaction_id = %update.payment.transaction_id,
            "PIX payment created"
        );

        Ok(CreatePixPaymentResult {
            payment: update.payment,
            plan: intent.plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::checkout::test_support::{pix_request, Fixture};
    use crate::domain::payment::PaymentStatus;
    use crate::ports::GatewayError;

    fn handler(fx: &Fixture) -> CreatePixPaymentHandler {
        CreatePixPaymentHandler::new(fx.catalog.clone(), fx.ledger.clone(), fx.gateway.clone(), 3600)
    }

    #[tokio::test]
    async fn returns_qr_code_and_leaves_payment_pending() {
        let fx = Fixture::new();
        let result = handler(&fx)
            .handle(CreatePixPaymentCommand {
                request: pix_request(),
            })
            .await
            .unwrap();

        assert_eq!(result.payment.status, PaymentStatus::Pending);
        assert!(!result.payment.transaction_id.is_unassigned());
        assert!(result.payment.pix.qr_code.is_some());
        assert!(result.payment.pix.qr_code_url.is_some());
        assert!(result.payment.pix.expires_at.is_some());
        assert_eq!(result.payment.amount.as_decimal(), 99.9);
        assert_eq!(fx.gateway.call_count("create_pix_payment"), 1);
    }

    #[tokio::test]
    async fn missing_customer_id_is_rejected_before_the_gateway() {
        let fx = Fixture::new();
        let mut request = pix_request();
        request.customer_id = None;

        let err = handler(&fx)
            .handle(CreatePixPaymentCommand { request })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(fx.gateway.api_call_count(), 0);
        assert!(fx.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let fx = Fixture::new();
        let mut request = pix_request();
        request.plan_id = Some(99);

        let err = handler(&fx)
            .handle(CreatePixPaymentCommand { request })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(fx.gateway.api_call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let fx = Fixture::new();
        let mut request = pix_request();
        request.customer_id = Some(404);

        let err = handler(&fx)
            .handle(CreatePixPaymentCommand { request })
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Customer 404 not found");
        assert!(fx.ledger.all().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_leaves_pending_row_without_reference() {
        let fx = Fixture::new();
        fx.gateway
            .set_method_error("create_pix_payment", GatewayError::network("timeout"));

        let err = handler(&fx)
            .handle(CreatePixPaymentCommand {
                request: pix_request(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), "GATEWAY_ERROR");
        let rows = fx.ledger.all();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PaymentStatus::Pending);
        assert!(rows[0].transaction_id.is_unassigned());
    }
}
