//! In-memory adapters.
//!
//! Each store keeps its rows behind one mutex and performs every
//! read-modify-write while holding it, which gives the same per-row
//! atomicity the PostgreSQL adapters get from transactions. Used by tests
//! and by the binary when no database URL is configured.

mod catalog;
mod payment_ledger;
mod subscription_store;

pub use catalog::InMemoryCatalog;
pub use payment_ledger::InMemoryPaymentLedger;
pub use subscription_store::InMemorySubscriptionStore;

use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{DomainError, ErrorCode};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DomainError> {
    mutex.lock().map_err(|_| {
        DomainError::new(ErrorCode::InternalError, format!("{}: lock poisoned", name))
    })
}
