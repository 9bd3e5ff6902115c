//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod checkout;

pub use checkout::{
    CreateCardPaymentCommand, CreateCardPaymentHandler, CreateCardPaymentResult,
    CreatePixPaymentCommand, CreatePixPaymentHandler, CreatePixPaymentResult,
    GetCheckoutConfigHandler, GetPaymentStatusHandler, GetPaymentStatusQuery,
    GetPaymentStatusResult, HandleGatewayWebhookCommand, HandleGatewayWebhookHandler,
    HandleGatewayWebhookResult, SubscriptionActivator,
};
