//! Payment ledger domain.
//!
//! One [`Payment`] per purchase attempt. Status only moves from pending to
//! a terminal value, and the gateway transaction id is written at most once.

mod aggregate;
mod gateway_refs;
mod method;
mod status;

pub use aggregate::{Payment, PaymentAttempt, PaymentUpdate, StatusChange};
pub use gateway_refs::{AcquirerResponse, CardDetails, GatewayRefs, PixDetails};
pub use method::PaymentMethod;
pub use status::PaymentStatus;
