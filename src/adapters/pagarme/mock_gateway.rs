//! Mock payment gateway for testing.
//!
//! Provides a configurable implementation of `PaymentGateway` for unit and
//! integration tests. Supports:
//! - Scripted card verdicts and order states
//! - Error injection
//! - Call tracking
//! - Signed webhook generation (real HMAC under the mock's secret)

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::foundation::{Timestamp, TransactionId};
use crate::domain::gateway::{sign_payload, ChargeStatus, GatewayEvent, WebhookSignatureVerifier};
use crate::domain::payment::{CardDetails, PaymentMethod};
use crate::ports::{
    CardChargeRequest, GatewayCharge, GatewayError, GatewayTransaction, LastTransaction,
    PaymentGateway, PixChargeRequest,
};

use super::pagarme_adapter::{parse_webhook_event, webhook_body};

/// Webhook secret used unless another one is configured.
pub const MOCK_WEBHOOK_SECRET: &str = "whsec_mock_secret";

/// Public key reported by the mock.
pub const MOCK_PUBLIC_KEY: &str = "pk_test_mock";

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.decline_cards("1011", "Cartão expirado");
///
/// let (signature, body) = gateway.signed_webhook("order.paid", &tx_id).unwrap();
/// ```
#[derive(Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
    webhook_secret: String,
}

struct MockState {
    /// Orders created or scripted, by id.
    orders: HashMap<String, MockOrder>,

    next_seq: u64,

    /// Verdict returned by the next card charges.
    card_outcome: CardOutcome,

    /// Specific errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Always fail signature checks.
    reject_webhooks: bool,
}

#[derive(Debug, Clone)]
struct MockOrder {
    transaction: GatewayTransaction,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct CardOutcome {
    status: ChargeStatus,
    code: String,
    message: String,
}

impl CardOutcome {
    fn approved() -> Self {
        Self {
            status: ChargeStatus::Paid,
            code: "00".to_string(),
            message: "Transação aprovada com sucesso".to_string(),
        }
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPaymentGateway {
    /// Create a mock that approves every card.
    pub fn new() -> Self {
        Self::with_webhook_secret(MOCK_WEBHOOK_SECRET)
    }

    pub fn with_webhook_secret(secret: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                orders: HashMap::new(),
                next_seq: 0,
                card_outcome: CardOutcome::approved(),
                method_errors: HashMap::new(),
                call_log: Vec::new(),
                reject_webhooks: false,
            })),
            webhook_secret: secret.into(),
        }
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().reject_webhooks = true;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Refuse subsequent card charges with the given acquirer response.
    pub fn decline_cards(&self, code: &str, message: &str) {
        self.inner.lock().unwrap().card_outcome = CardOutcome {
            status: ChargeStatus::Failed,
            code: code.to_string(),
            message: message.to_string(),
        };
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.method_errors.clear();
    }

    /// Move an order's charge to `status`, as if the payer acted on it.
    ///
    /// Returns false when the order is unknown.
    pub fn set_charge_status(&self, transaction_id: &TransactionId, status: ChargeStatus) -> bool {
        let mut state = self.inner.lock().unwrap();
        match state
            .orders
            .get_mut(transaction_id.as_str())
            .and_then(|order| order.transaction.charges.first_mut())
        {
            Some(charge) => {
                charge.status = status;
                true
            }
            None => false,
        }
    }

    pub fn transaction(&self, transaction_id: &TransactionId) -> Option<GatewayTransaction> {
        self.inner
            .lock()
            .unwrap()
            .orders
            .get(transaction_id.as_str())
            .map(|order| order.transaction.clone())
    }

    /// Webhook body and signature header for an order this mock knows.
    pub fn signed_webhook(
        &self,
        event_type: &str,
        transaction_id: &TransactionId,
    ) -> Option<(String, Vec<u8>)> {
        let order = self
            .inner
            .lock()
            .unwrap()
            .orders
            .get(transaction_id.as_str())
            .cloned()?;
        let body = webhook_body(event_type, &webhook_data(event_type, &order)?);
        Some((self.sign(&body), body))
    }

    /// Signature header for an arbitrary body under the mock's secret.
    pub fn sign(&self, body: &[u8]) -> String {
        sign_payload(&self.webhook_secret, body)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Calls that reached the gateway API (charges and lookups).
    pub fn api_call_count(&self) -> usize {
        ["create_pix_payment", "create_card_payment", "get_transaction"]
            .iter()
            .map(|method| self.call_count(method))
            .sum()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        match self.inner.lock().unwrap().method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn store(&self, order: MockOrder) -> GatewayTransaction {
        let transaction = order.transaction.clone();
        self.inner
            .lock()
            .unwrap()
            .orders
            .insert(transaction.id.as_str().to_string(), order);
        transaction
    }

    fn next_seq(&self) -> u64 {
        let mut state = self.inner.lock().unwrap();
        state.next_seq += 1;
        state.next_seq
    }
}

fn card_brand(number: &str) -> &'static str {
    match number.chars().next() {
        Some('4') => "Visa",
        Some('5') => "Mastercard",
        Some('3') => "Amex",
        _ => "Elo",
    }
}

/// Wire JSON of a charge as it appears inside an order.
fn charge_json(charge: &GatewayCharge) -> serde_json::Value {
    let last = charge.last_transaction.clone().unwrap_or_default();
    serde_json::json!({
        "id": charge.id,
        "status": charge.status.as_str(),
        "payment_method": charge.payment_method.map(|m| m.as_str()),
        "amount": charge.amount_cents,
        "last_transaction": {
            "qr_code": last.pix_qr_code,
            "qr_code_url": last.pix_qr_code_url,
            "expires_at": last.pix_expires_at.map(|t| t.to_rfc3339()),
            "acquirer_return_code": last.acquirer_response_code,
            "acquirer_message": last.acquirer_message,
            "card": last.card.map(|card| serde_json::json!({
                "id": card.card_id,
                "brand": card.brand,
                "last_four_digits": card.last_four,
                "holder_name": card.holder_name,
            })),
        },
    })
}

/// Wire JSON of an order, in the shape `order.*` webhooks deliver it.
fn order_json(order: &MockOrder) -> serde_json::Value {
    let tx = &order.transaction;
    let charges: Vec<serde_json::Value> = tx.charges.iter().map(charge_json).collect();

    serde_json::json!({
        "id": tx.id.as_str(),
        "customer": tx.customer_id.as_ref().map(|id| serde_json::json!({ "id": id })),
        "metadata": order.metadata,
        "charges": charges,
    })
}

/// `data` for a webhook: the order for `order.*`, its first charge for `charge.*`.
fn webhook_data(event_type: &str, order: &MockOrder) -> Option<serde_json::Value> {
    if !event_type.starts_with("charge.") {
        return Some(order_json(order));
    }
    let tx = &order.transaction;
    let mut charge = charge_json(tx.charges.first()?);
    if let Some(fields) = charge.as_object_mut() {
        fields.insert("order".into(), serde_json::json!({ "id": tx.id.as_str() }));
        fields.insert("metadata".into(), serde_json::json!(order.metadata));
        fields.insert(
            "customer".into(),
            serde_json::json!(tx.customer_id.as_ref().map(|id| serde_json::json!({ "id": id }))),
        );
    }
    Some(charge)
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_pix_payment(
        &self,
        request: PixChargeRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.record_call(
            "create_pix_payment",
            vec![
                request.metadata.payment_id.to_string(),
                request.amount.cents().to_string(),
            ],
        );
        self.check_error("create_pix_payment")?;

        let seq = self.next_seq();
        let charge_id = format!("ch_mock_{}", seq);
        let transaction = GatewayTransaction {
            id: TransactionId::new(format!("or_mock_{}", seq))
                .map_err(|e| GatewayError::provider(e.to_string()))?,
            customer_id: Some(format!("cus_mock_{}", seq)),
            charges: vec![GatewayCharge {
                id: charge_id.clone(),
                status: ChargeStatus::Pending,
                payment_method: Some(PaymentMethod::Pix),
                amount_cents: Some(request.amount.cents()),
                fee_cents: None,
                last_transaction: Some(LastTransaction {
                    pix_qr_code: Some(format!("00020126580014br.gov.bcb.pix0136mock{}", seq)),
                    pix_qr_code_url: Some(format!(
                        "https://api.pagar.me/core/v5/transactions/{}/qrcode",
                        charge_id
                    )),
                    pix_expires_at: Some(Timestamp::now().plus_secs(i64::from(request.expires_in))),
                    ..Default::default()
                }),
            }],
        };

        Ok(self.store(MockOrder {
            transaction,
            metadata: request.metadata.to_map(),
        }))
    }

    async fn create_card_payment(
        &self,
        request: CardChargeRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.record_call(
            "create_card_payment",
            vec![
                request.metadata.payment_id.to_string(),
                request.card.last_four().to_string(),
            ],
        );
        self.check_error("create_card_payment")?;

        let seq = self.next_seq();
        let outcome = self.inner.lock().unwrap().card_outcome.clone();
        let transaction = GatewayTransaction {
            id: TransactionId::new(format!("or_mock_{}", seq))
                .map_err(|e| GatewayError::provider(e.to_string()))?,
            customer_id: Some(format!("cus_mock_{}", seq)),
            charges: vec![GatewayCharge {
                id: format!("ch_mock_{}", seq),
                status: outcome.status,
                payment_method: Some(PaymentMethod::CreditCard),
                amount_cents: Some(request.amount.cents()),
                fee_cents: None,
                last_transaction: Some(LastTransaction {
                    acquirer_response_code: Some(outcome.code),
                    acquirer_message: Some(outcome.message),
                    card: Some(CardDetails {
                        brand: Some(card_brand(&request.card.number).to_string()),
                        last_four: Some(request.card.last_four().to_string()),
                        holder_name: Some(request.card.holder_name.clone()),
                        card_id: Some(format!("card_mock_{}", seq)),
                    }),
                    ..Default::default()
                }),
            }],
        };

        Ok(self.store(MockOrder {
            transaction,
            metadata: request.metadata.to_map(),
        }))
    }

    async fn get_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.record_call("get_transaction", vec![transaction_id.to_string()]);
        self.check_error("get_transaction")?;

        self.transaction(transaction_id)
            .ok_or_else(|| GatewayError::not_found("Order"))
    }

    fn validate_webhook(&self, signature_header: &str, raw_body: &[u8]) -> bool {
        self.record_call("validate_webhook", vec![signature_header.to_string()]);
        if self.inner.lock().unwrap().reject_webhooks {
            return false;
        }
        WebhookSignatureVerifier::new(SecretString::new(self.webhook_secret.clone()))
            .is_valid(signature_header, raw_body)
    }

    fn process_webhook(&self, raw_body: &[u8]) -> Result<GatewayEvent, GatewayError> {
        self.record_call("process_webhook", vec![]);
        self.check_error("process_webhook")?;
        parse_webhook_event(raw_body)
    }

    fn public_key(&self) -> String {
        MOCK_PUBLIC_KEY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BilledEntity;
    use crate::domain::checkout::TaxDocument;
    use crate::domain::foundation::{CustomerId, Money, PaymentId, PlanId};
    use crate::domain::payment::PaymentStatus;
    use crate::ports::{ChargeMetadata, GatewayCustomer};

    fn pix_request() -> PixChargeRequest {
        PixChargeRequest {
            amount: Money::brl(9990).unwrap(),
            description: "Pro".into(),
            customer: GatewayCustomer {
                name: "Maria".into(),
                email: "maria@example.com".into(),
                document: TaxDocument::parse("12345678909").unwrap(),
                phone: None,
                address: None,
            },
            expires_in: 3600,
            metadata: ChargeMetadata {
                payment_id: PaymentId::new(11).unwrap(),
                plan_id: PlanId::new(1).unwrap(),
                billed_entity: BilledEntity::Customer(CustomerId::new(7).unwrap()),
            },
        }
    }

    #[tokio::test]
    async fn pix_order_is_pending_with_qr_code() {
        let gateway = MockPaymentGateway::new();
        let tx = gateway.create_pix_payment(pix_request()).await.unwrap();

        assert_eq!(tx.charge_status(), ChargeStatus::Pending);
        assert!(tx.to_refs().pix.unwrap().qr_code.is_some());
        assert_eq!(gateway.call_count("create_pix_payment"), 1);
        assert_eq!(gateway.calls()[0].args, vec!["11".to_string(), "9990".to_string()]);
    }

    #[tokio::test]
    async fn signed_webhook_round_trips_through_parser() {
        let gateway = MockPaymentGateway::new();
        let tx = gateway.create_pix_payment(pix_request()).await.unwrap();
        gateway.set_charge_status(&tx.id, ChargeStatus::Paid);

        let (signature, body) = gateway.signed_webhook("order.paid", &tx.id).unwrap();
        assert!(gateway.validate_webhook(&signature, &body));

        let event = gateway.process_webhook(&body).unwrap();
        assert_eq!(event.status(), Some(PaymentStatus::Completed));
        let reference = event.reference().unwrap();
        assert_eq!(reference.transaction_id, tx.id);
        assert_eq!(reference.payment_id.map(|id| id.as_i64()), Some(11));
    }

    #[tokio::test]
    async fn charge_webhook_carries_charge_with_order_link() {
        let gateway = MockPaymentGateway::new();
        let tx = gateway.create_pix_payment(pix_request()).await.unwrap();
        gateway.set_charge_status(&tx.id, ChargeStatus::Failed);

        let (signature, body) = gateway.signed_webhook("charge.refused", &tx.id).unwrap();
        assert!(gateway.validate_webhook(&signature, &body));

        let event = gateway.process_webhook(&body).unwrap();
        assert!(matches!(event, GatewayEvent::PixFailed { .. }));
        let reference = event.reference().unwrap();
        assert_eq!(reference.transaction_id, tx.id);
        assert_eq!(reference.charge_id.as_deref(), Some("ch_mock_1"));
        assert_eq!(reference.payment_id.map(|id| id.as_i64()), Some(11));
    }

    #[tokio::test]
    async fn method_error_is_returned() {
        let gateway = MockPaymentGateway::new();
        gateway.set_method_error("create_pix_payment", GatewayError::network("timeout"));

        assert!(gateway.create_pix_payment(pix_request()).await.is_err());
        gateway.clear_errors();
        assert!(gateway.create_pix_payment(pix_request()).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let gateway = MockPaymentGateway::new();
        let err = gateway
            .get_transaction(&TransactionId::new("or_missing").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::ports::GatewayErrorCode::NotFound);
    }

    #[test]
    fn rejecting_mock_fails_valid_signatures() {
        let gateway = MockPaymentGateway::rejecting_webhooks();
        let body = b"{}";
        assert!(!gateway.validate_webhook(&gateway.sign(body), body));
    }
}
