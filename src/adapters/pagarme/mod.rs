//! Pagar.me payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for Pagar.me v5, including:
//! - PIX and credit card orders
//! - Order lookup for status polling
//! - Webhook signature verification and event parsing
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - All secrets are handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! Required environment variables:
//! - `CHECKOUT__PAGARME__SECRET_KEY`: secret API key (sk_...)
//! - `CHECKOUT__PAGARME__PUBLIC_KEY`: public key (pk_...)
//! - `CHECKOUT__PAGARME__WEBHOOK_SECRET`: webhook signing secret

mod api_types;
mod mock_gateway;
mod pagarme_adapter;

pub use api_types::{PagarmeCharge, PagarmeOrder, PagarmeWebhookEvent};
pub use mock_gateway::{MethodCall, MockPaymentGateway, MOCK_PUBLIC_KEY, MOCK_WEBHOOK_SECRET};
pub use pagarme_adapter::{
    webhook_body, PagarmeConfig, PagarmePaymentAdapter, DEFAULT_API_BASE_URL,
};
