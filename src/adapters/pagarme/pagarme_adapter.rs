//! Pagar.me payment gateway adapter.
//!
//! Implements the `PaymentGateway` trait against the Pagar.me v5 core API.
//! Every checkout becomes a closed order with a single charge.
//!
//! # Security
//!
//! - HMAC-SHA256 webhook signatures compared in constant time
//! - Secret key and webhook secret held as `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = PagarmeConfig::new(secret_key, public_key, webhook_secret);
//! let adapter = PagarmePaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::gateway::{GatewayEvent, WebhookSignatureVerifier};
use crate::domain::payment::{
    AcquirerResponse, CardDetails, PaymentMethod, PaymentStatus, PixDetails,
};
use crate::ports::{
    CardChargeRequest, GatewayError, GatewayTransaction, LastTransaction, PaymentGateway,
    PixChargeRequest,
};

use super::api_types::{
    OrderRequest, PagarmeCharge, PagarmeErrorBody, PagarmeOrder, PagarmeWebhookEvent,
    WebhookCharge,
};

/// Default API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.pagar.me/core/v5";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pagar.me API configuration.
#[derive(Clone)]
pub struct PagarmeConfig {
    /// Secret API key (sk_...).
    secret_key: SecretString,

    /// Public key handed to the browser for card tokenisation (pk_...).
    public_key: String,

    /// Shared webhook signing secret.
    webhook_secret: SecretString,

    api_base_url: String,

    /// Text shown on the payer's card statement.
    statement_descriptor: Option<String>,
}

impl PagarmeConfig {
    pub fn new(
        secret_key: impl Into<String>,
        public_key: impl Into<String>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            secret_key: SecretString::new(secret_key.into()),
            public_key: public_key.into(),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            statement_descriptor: None,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_statement_descriptor(mut self, descriptor: Option<String>) -> Self {
        self.statement_descriptor = descriptor.filter(|d| !d.trim().is_empty());
        self
    }
}

impl std::fmt::Debug for PagarmeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagarmeConfig")
            .field("public_key", &self.public_key)
            .field("api_base_url", &self.api_base_url)
            .field("statement_descriptor", &self.statement_descriptor)
            .finish_non_exhaustive()
    }
}

/// Pagar.me payment gateway adapter.
pub struct PagarmePaymentAdapter {
    config: PagarmeConfig,
    verifier: WebhookSignatureVerifier,
    http_client: reqwest::Client,
}

impl PagarmePaymentAdapter {
    pub fn new(config: PagarmeConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            verifier: WebhookSignatureVerifier::new(config.webhook_secret.clone()),
            config,
            http_client,
        })
    }

    async fn post_order(&self, body: &OrderRequest) -> Result<GatewayTransaction, GatewayError> {
        let url = format!("{}/orders", self.config.api_base_url);
        let idempotency_key = Uuid::new_v4().to_string();

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Some(""))
            .header("Idempotency-Key", &idempotency_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Pagar.me create order request failed");
                GatewayError::network(e.to_string())
            })?;

        let order: PagarmeOrder = read_json(response, "create_order").await?;
        tracing::info!(
            order_id = %order.id,
            order_status = order.status.as_deref().unwrap_or("unknown"),
            idempotency_key = %idempotency_key,
            "Pagar.me order created"
        );
        GatewayTransaction::try_from(order)
    }
}

/// Converts a verified webhook body into a domain event.
pub(super) fn parse_webhook_event(payload: &[u8]) -> Result<GatewayEvent, GatewayError> {
    let event: PagarmeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse webhook payload");
        GatewayError::invalid_webhook(format!("Invalid JSON: {}", e))
    })?;

    let asserted = match event.event_type.as_str() {
        "order.paid" | "charge.paid" => PaymentStatus::Completed,
        "order.payment_failed" | "charge.payment_failed" | "charge.refused" => {
            PaymentStatus::Failed
        }
        other => {
            tracing::debug!(event_id = %event.id, event_type = other, "Ignoring webhook type");
            return Ok(GatewayEvent::Unknown {
                event_type: other.to_string(),
            });
        }
    };

    let charge = extract_charge(&event)?;
    let reference = charge.reference()?;
    let last = charge
        .charge
        .last_transaction
        .as_ref()
        .map(LastTransaction::from)
        .unwrap_or_default();

    let gateway_event = match (charge.charge.method(), asserted) {
        (Some(PaymentMethod::CreditCard), status) => GatewayEvent::CardResult {
            reference,
            status,
            card: last.card.clone().unwrap_or_else(CardDetails::default),
            acquirer: AcquirerResponse {
                code: last.acquirer_response_code,
                message: last.acquirer_message,
            },
        },
        (_, PaymentStatus::Completed) => GatewayEvent::PixCompleted {
            reference,
            pix: PixDetails {
                qr_code: last.pix_qr_code,
                qr_code_url: last.pix_qr_code_url,
                expires_at: last.pix_expires_at,
            },
        },
        (_, _) => GatewayEvent::PixFailed {
            reference,
            message: last.acquirer_message,
        },
    };
    Ok(gateway_event)
}

fn extract_charge(event: &PagarmeWebhookEvent) -> Result<WebhookCharge, GatewayError> {
    let charge = if event.event_type.starts_with("order.") {
        let order: PagarmeOrder = serde_json::from_value(event.data.clone())
            .map_err(|e| GatewayError::invalid_webhook(format!("Invalid order: {}", e)))?;
        WebhookCharge::from_order(order)
    } else {
        let charge: PagarmeCharge = serde_json::from_value(event.data.clone())
            .map_err(|e| GatewayError::invalid_webhook(format!("Invalid charge: {}", e)))?;
        WebhookCharge::from_charge(charge)
    };
    charge.ok_or_else(|| {
        GatewayError::invalid_webhook(format!("Event {} has no charge reference", event.id))
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PagarmeErrorBody>(&error_text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        tracing::error!(
            operation,
            status = status.as_u16(),
            error = %error_text,
            "Pagar.me request failed"
        );
        let err = match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                GatewayError::authentication(message)
            }
            reqwest::StatusCode::NOT_FOUND => GatewayError::not_found("Order"),
            reqwest::StatusCode::TOO_MANY_REQUESTS => GatewayError::new(
                crate::ports::GatewayErrorCode::RateLimitExceeded,
                message,
            ),
            s if s.is_client_error() => GatewayError::invalid_request(message),
            _ => GatewayError::provider(message),
        };
        return Err(err.with_provider_code(status.as_u16().to_string()));
    }

    response.json::<T>().await.map_err(|e| {
        GatewayError::provider(format!("Failed to parse Pagar.me response: {}", e))
    })
}

#[async_trait]
impl PaymentGateway for PagarmePaymentAdapter {
    async fn create_pix_payment(
        &self,
        request: PixChargeRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.post_order(&OrderRequest::pix(&request)).await
    }

    async fn create_card_payment(
        &self,
        request: CardChargeRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        let body = OrderRequest::card(&request, self.config.statement_descriptor.as_deref());
        self.post_order(&body).await
    }

    async fn get_transaction(
        &self,
        transaction_id: &crate::domain::foundation::TransactionId,
    ) -> Result<GatewayTransaction, GatewayError> {
        let url = format!("{}/orders/{}", self.config.api_base_url, transaction_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Some(""))
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let order: PagarmeOrder = read_json(response, "get_order").await?;
        GatewayTransaction::try_from(order)
    }

    fn validate_webhook(&self, signature_header: &str, raw_body: &[u8]) -> bool {
        let valid = self.verifier.is_valid(signature_header, raw_body);
        if !valid {
            tracing::warn!("Invalid webhook signature");
        }
        valid
    }

    fn process_webhook(&self, raw_body: &[u8]) -> Result<GatewayEvent, GatewayError> {
        parse_webhook_event(raw_body)
    }

    fn public_key(&self) -> String {
        self.config.public_key.clone()
    }
}

/// Serialises an order into a webhook body, as Pagar.me would deliver it.
///
/// Exposed for tests that post webhooks against the HTTP surface.
pub fn webhook_body(event_type: &str, data: &impl Serialize) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": format!("hook_{}", Uuid::new_v4().simple()),
        "type": event_type,
        "data": data,
    }))
    .unwrap_or_default()
}
