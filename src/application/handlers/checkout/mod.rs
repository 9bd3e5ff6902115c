//! Checkout handlers.
//!
//! ## Commands
//! - Creating PIX payments (QR code, settled later)
//! - Creating card payments (synchronous verdict, activates on approval)
//! - Processing gateway webhooks
//!
//! ## Queries
//! - Payment status (re-reads the gateway while pending)
//! - Client checkout configuration
//!
//! Every path that sees a completed payment goes through
//! [`SubscriptionActivator`].

mod activate_subscription;
mod create_card_payment;
mod create_pix_payment;
mod get_checkout_config;
mod get_payment_status;
mod handle_gateway_webhook;
mod payment_intent;

#[cfg(test)]
mod test_support;

pub use activate_subscription::SubscriptionActivator;

// Commands
pub use create_card_payment::{
    CreateCardPaymentCommand, CreateCardPaymentHandler, CreateCardPaymentResult,
};
pub use create_pix_payment::{
    CreatePixPaymentCommand, CreatePixPaymentHandler, CreatePixPaymentResult,
};
pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
};

// Queries
pub use get_checkout_config::GetCheckoutConfigHandler;
pub use get_payment_status::{
    GetPaymentStatusHandler, GetPaymentStatusQuery, GetPaymentStatusResult,
};
