//! Client-side port onto the checkout HTTP surface.
//!
//! The view types here are the JSON bodies the server returns; the HTTP
//! adapter serialises them and the client adapter deserialises them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::billing::BillingInterval;
use crate::domain::checkout::CheckoutRequest;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{PaymentMethod, PaymentStatus};

#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn create_pix_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<PixPaymentView, ClientError>;

    async fn create_card_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CardPaymentView, ClientError>;

    async fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatusView, ClientError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Response Views
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanView {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub interval: BillingInterval,
}

/// Body of `POST /checkout/pix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixPaymentView {
    pub payment_id: i64,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_url: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub amount: f64,
    pub currency: String,
    pub plan: PlanView,
}

/// Card verdict as shown to the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardVerdict {
    Approved,
    Failed,
}

impl CardVerdict {
    pub fn from_status(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Completed => CardVerdict::Approved,
            PaymentStatus::Pending | PaymentStatus::Failed => CardVerdict::Failed,
        }
    }
}

/// Body of `POST /checkout/card`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPaymentView {
    pub payment_id: i64,
    pub transaction_id: String,
    pub status: CardVerdict,
    pub subscription_id: Option<i64>,
    pub acquirer_message: Option<String>,
}

/// Body of `GET /checkout/status/:transaction_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub payment_id: i64,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub pix_qr_code: Option<String>,
    pub pix_qr_code_url: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub acquirer_message: Option<String>,
    pub subscription_id: Option<i64>,
}

/// Body of `GET /checkout/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfigView {
    pub public_key: String,
    pub payment_methods: Vec<PaymentMethod>,
    pub pix_expires_in: u32,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Client Errors
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Server answered with a non-2xx status.
    #[error("API error {status}: [{code}] {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Server-provided message when there is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_api_is_object_safe() {
        fn _accepts_dyn(_api: &dyn CheckoutApi) {}
    }

    #[test]
    fn card_verdict_is_approved_only_when_completed() {
        assert_eq!(CardVerdict::from_status(PaymentStatus::Completed), CardVerdict::Approved);
        assert_eq!(CardVerdict::from_status(PaymentStatus::Failed), CardVerdict::Failed);
        assert_eq!(CardVerdict::from_status(PaymentStatus::Pending), CardVerdict::Failed);
    }

    #[test]
    fn card_view_serializes_verdict_in_snake_case() {
        let view = CardPaymentView {
            payment_id: 1,
            transaction_id: "or_1".into(),
            status: CardVerdict::Approved,
            subscription_id: Some(3),
            acquirer_message: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "approved");
        assert_eq!(json["subscription_id"], 3);
    }

    #[test]
    fn server_message_ignores_transport_errors() {
        assert!(ClientError::Transport("refused".into()).server_message().is_none());
        let err = ClientError::Api {
            status: 500,
            code: "GATEWAY_ERROR".into(),
            message: "Cartão recusado".into(),
        };
        assert_eq!(err.server_message(), Some("Cartão recusado"));
    }
}
