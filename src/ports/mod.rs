//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Server Ports
//!
//! - `PaymentGateway` - Charge creation, order lookup, webhook parsing
//! - `PaymentLedger` - Payment rows and their idempotent status changes
//! - `SubscriptionRepository` - Serialised subscription activation
//! - `CatalogReader` - Plans, companies and customers (read-only)
//!
//! ## Client Ports
//!
//! - `CheckoutApi` - What a checkout session calls on the server

mod catalog_reader;
mod checkout_api;
mod payment_gateway;
mod payment_ledger;
mod subscription_repository;

pub use catalog_reader::CatalogReader;
pub use checkout_api::{
    CardPaymentView, CardVerdict, CheckoutApi, CheckoutConfigView, ClientError, ErrorBody,
    PaymentStatusView, PixPaymentView, PlanView,
};
pub use payment_gateway::{
    CardChargeRequest, ChargeMetadata, GatewayCharge, GatewayCustomer, GatewayError,
    GatewayErrorCode, GatewayTransaction, LastTransaction, PaymentGateway, PixChargeRequest,
};
pub use payment_ledger::{payment_not_found, PaymentLedger};
pub use subscription_repository::SubscriptionRepository;
