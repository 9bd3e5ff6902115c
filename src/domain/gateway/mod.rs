//! Gateway-facing domain types.
//!
//! Gateway payloads are parsed once at the adapter boundary into
//! [`GatewayEvent`] and [`ChargeStatus`]; reconcilers only match on these.

mod charge_status;
mod event;
mod signature;
mod webhook_errors;

pub use charge_status::ChargeStatus;
pub use event::{ChargeReference, GatewayEvent};
pub use signature::{sign_payload, SignatureHeader, WebhookSignatureVerifier, SIGNATURE_HEADER};
pub use webhook_errors::WebhookError;
