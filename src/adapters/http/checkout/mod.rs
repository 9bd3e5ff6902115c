//! HTTP adapter for checkout endpoints.
//!
//! - `POST /checkout/pix` - Open a PIX payment
//! - `POST /checkout/card` - Charge a card
//! - `GET /checkout/status/:transaction_id` - Poll a payment
//! - `GET /checkout/config` - Public key and supported methods
//! - `POST /webhook/pagarme` - Handle Pagar.me webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{CheckoutApiError, CheckoutAppState, WebhookApiError};
pub use routes::checkout_router;
