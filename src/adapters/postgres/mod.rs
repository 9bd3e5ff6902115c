//! PostgreSQL adapters - Database implementations for the server ports.
//!
//! - `PostgresPaymentLedger` - Payment rows with row-locked status changes
//! - `PostgresSubscriptionRepository` - Advisory-locked activation
//! - `PostgresCatalogReader` - Plans, companies and customers

mod catalog_reader;
mod payment_ledger;
mod subscription_repository;

pub use catalog_reader::PostgresCatalogReader;
pub use payment_ledger::PostgresPaymentLedger;
pub use subscription_repository::PostgresSubscriptionRepository;
