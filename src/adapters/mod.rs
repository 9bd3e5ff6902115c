//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `pagarme` - Payment gateway (HTTP client and configurable mock)
//! - `postgres` - Payment ledger, subscriptions and catalog on PostgreSQL
//! - `memory` - The same stores in process, for tests and local runs
//! - `http` - Axum routes for the checkout API and gateway webhooks
//! - `checkout_client` - reqwest client for the checkout API

pub mod checkout_client;
pub mod http;
pub mod memory;
pub mod pagarme;
pub mod postgres;

pub use checkout_client::HttpCheckoutApi;
pub use memory::{InMemoryCatalog, InMemoryPaymentLedger, InMemorySubscriptionStore};
pub use pagarme::{MockPaymentGateway, PagarmeConfig, PagarmePaymentAdapter};
pub use postgres::{PostgresCatalogReader, PostgresPaymentLedger, PostgresSubscriptionRepository};
