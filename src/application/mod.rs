//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Server-side handlers live in [`handlers`]; [`checkout_session`] is the
//! client-side state machine that drives a checkout against the HTTP API.

pub mod checkout_session;
pub mod handlers;

pub use checkout_session::{CheckoutSession, FormData, SessionSnapshot};
pub use handlers::{
    CreateCardPaymentCommand, CreateCardPaymentHandler, CreateCardPaymentResult,
    CreatePixPaymentCommand, CreatePixPaymentHandler, CreatePixPaymentResult,
    GetCheckoutConfigHandler, GetPaymentStatusHandler, GetPaymentStatusQuery,
    GetPaymentStatusResult, HandleGatewayWebhookCommand, HandleGatewayWebhookHandler,
    HandleGatewayWebhookResult, SubscriptionActivator,
};
