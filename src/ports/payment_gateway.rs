//! Payment gateway port.
//!
//! Charges are created as gateway orders; each order carries one charge
//! whose `last_transaction` holds the PIX QR data or the acquirer verdict.
//! Webhook bodies are verified and normalised by the implementation, so
//! callers only ever see a [`GatewayEvent`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::BilledEntity;
use crate::domain::checkout::{
    BillingAddress, CheckoutError, Phone, TaxDocument, ValidCard, ValidCustomer,
};
use crate::domain::foundation::{Money, PaymentId, PlanId, Timestamp, TransactionId};
use crate::domain::gateway::{ChargeStatus, GatewayEvent};
use crate::domain::payment::{
    AcquirerResponse, CardDetails, GatewayRefs, PaymentMethod, PixDetails,
};

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a PIX order. The charge stays pending until paid out-of-band.
    async fn create_pix_payment(
        &self,
        request: PixChargeRequest,
    ) -> Result<GatewayTransaction, GatewayError>;

    /// Creates and captures a card order synchronously.
    async fn create_card_payment(
        &self,
        request: CardChargeRequest,
    ) -> Result<GatewayTransaction, GatewayError>;

    /// Fetches the current state of an order.
    async fn get_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<GatewayTransaction, GatewayError>;

    /// Checks the webhook signature header against the raw body.
    fn validate_webhook(&self, signature_header: &str, raw_body: &[u8]) -> bool;

    /// Parses a webhook body.
    ///
    /// Event types the engine does not act on come back as
    /// `GatewayEvent::Unknown`, not as an error.
    fn process_webhook(&self, raw_body: &[u8]) -> Result<GatewayEvent, GatewayError>;

    /// Public key for client-side card tokenisation.
    fn public_key(&self) -> String;
}

/// Payer identity sent with every order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCustomer {
    pub name: String,
    pub email: String,
    pub document: TaxDocument,
    pub phone: Option<Phone>,
    pub address: Option<BillingAddress>,
}

impl From<ValidCustomer> for GatewayCustomer {
    fn from(customer: ValidCustomer) -> Self {
        Self {
            name: customer.name,
            email: customer.email,
            document: customer.document,
            phone: customer.phone,
            address: customer.address,
        }
    }
}

/// Local references echoed back in webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeMetadata {
    pub payment_id: PaymentId,
    pub plan_id: PlanId,
    pub billed_entity: BilledEntity,
}

impl ChargeMetadata {
    /// String map in the form the gateway stores metadata.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("payment_id".to_string(), self.payment_id.to_string()),
            ("plan_id".to_string(), self.plan_id.to_string()),
            (
                "billed_entity_type".to_string(),
                self.billed_entity.kind().to_string(),
            ),
            (
                "billed_entity_id".to_string(),
                self.billed_entity.raw_id().to_string(),
            ),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixChargeRequest {
    pub amount: Money,
    pub description: String,
    pub customer: GatewayCustomer,
    /// QR code lifetime in seconds.
    pub expires_in: u32,
    pub metadata: ChargeMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardChargeRequest {
    pub amount: Money,
    pub description: String,
    pub customer: GatewayCustomer,
    pub card: ValidCard,
    pub billing_address: Option<BillingAddress>,
    pub metadata: ChargeMetadata,
}

/// Method-specific result of the most recent attempt on a charge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LastTransaction {
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_url: Option<String>,
    pub pix_expires_at: Option<Timestamp>,
    pub acquirer_response_code: Option<String>,
    pub acquirer_message: Option<String>,
    pub card: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCharge {
    pub id: String,
    pub status: ChargeStatus,
    pub payment_method: Option<PaymentMethod>,
    pub amount_cents: Option<i64>,
    pub fee_cents: Option<i64>,
    pub last_transaction: Option<LastTransaction>,
}

/// A gateway order with its charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub id: TransactionId,
    pub customer_id: Option<String>,
    pub charges: Vec<GatewayCharge>,
}

impl GatewayTransaction {
    /// The order's charge; checkout orders carry exactly one.
    pub fn primary_charge(&self) -> Option<&GatewayCharge> {
        self.charges.first()
    }

    /// Status of the primary charge, pending when the order has none yet.
    pub fn charge_status(&self) -> ChargeStatus {
        self.primary_charge()
            .map(|charge| charge.status.clone())
            .unwrap_or(ChargeStatus::Pending)
    }

    /// Ledger update for this order. No status is set; callers decide.
    pub fn to_refs(&self) -> GatewayRefs {
        let charge = self.primary_charge();
        let last = charge.and_then(|c| c.last_transaction.as_ref());

        let pix = last
            .filter(|t| t.pix_qr_code.is_some() || t.pix_qr_code_url.is_some())
            .map(|t| PixDetails {
                qr_code: t.pix_qr_code.clone(),
                qr_code_url: t.pix_qr_code_url.clone(),
                expires_at: t.pix_expires_at,
            });
        let acquirer = last
            .filter(|t| t.acquirer_response_code.is_some() || t.acquirer_message.is_some())
            .map(|t| AcquirerResponse {
                code: t.acquirer_response_code.clone(),
                message: t.acquirer_message.clone(),
            });

        GatewayRefs {
            transaction_id: Some(self.id.clone()),
            charge_id: charge.map(|c| c.id.clone()),
            gateway_customer_id: self.customer_id.clone(),
            pix,
            card: last.and_then(|t| t.card.clone()),
            acquirer,
            fee_cents: charge.and_then(|c| c.fee_cents),
            metadata: None,
            status: None,
        }
    }
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Gateway's own error code, if it sent one.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidRequest, message)
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidWebhook, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        CheckoutError::gateway(err.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    AuthenticationError,
    NotFound,
    InvalidRequest,
    RateLimitExceeded,
    InvalidWebhook,
    ProviderError,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::InvalidWebhook => "invalid_webhook",
            GatewayErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CustomerId;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    fn pix_transaction() -> GatewayTransaction {
        GatewayTransaction {
            id: TransactionId::new("or_1").unwrap(),
            customer_id: Some("cus_1".into()),
            charges: vec![GatewayCharge {
                id: "ch_1".into(),
                status: ChargeStatus::Pending,
                payment_method: Some(PaymentMethod::Pix),
                amount_cents: Some(9990),
                fee_cents: None,
                last_transaction: Some(LastTransaction {
                    pix_qr_code: Some("000201".into()),
                    pix_qr_code_url: Some("https://qr".into()),
                    ..Default::default()
                }),
            }],
        }
    }

    #[test]
    fn metadata_map_uses_string_values() {
        let metadata = ChargeMetadata {
            payment_id: PaymentId::new(5).unwrap(),
            plan_id: PlanId::new(1).unwrap(),
            billed_entity: BilledEntity::Customer(CustomerId::new(7).unwrap()),
        };
        let map = metadata.to_map();
        assert_eq!(map["payment_id"], "5");
        assert_eq!(map["billed_entity_type"], "customer");
        assert_eq!(map["billed_entity_id"], "7");
    }

    #[test]
    fn refs_carry_pix_data_and_ids() {
        let refs = pix_transaction().to_refs();
        assert_eq!(refs.transaction_id.unwrap().as_str(), "or_1");
        assert_eq!(refs.charge_id.as_deref(), Some("ch_1"));
        assert_eq!(refs.pix.unwrap().qr_code.as_deref(), Some("000201"));
        assert!(refs.acquirer.is_none());
        assert!(refs.status.is_none());
    }

    #[test]
    fn order_without_charges_reads_as_pending() {
        let tx = GatewayTransaction {
            charges: vec![],
            ..pix_transaction()
        };
        assert_eq!(tx.charge_status(), ChargeStatus::Pending);
        assert!(tx.to_refs().charge_id.is_none());
    }

    #[test]
    fn gateway_error_retryable() {
        assert!(GatewayError::network("timeout").retryable);
        assert!(!GatewayError::authentication("bad key").retryable);
    }

    #[test]
    fn gateway_error_becomes_checkout_gateway_error() {
        let err: CheckoutError = GatewayError::provider("HTTP 502").into();
        assert_eq!(err.code(), "GATEWAY_ERROR");
    }
}
