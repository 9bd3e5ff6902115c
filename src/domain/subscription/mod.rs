//! Subscription domain.
//!
//! At most one subscription per (billed entity, plan) may be open
//! (`active` or `pending`). Activation either promotes that open row or
//! creates a new active one.

mod activation;
mod aggregate;
mod status;

pub use activation::{
    decide_activation, Activation, ActivationDecision, ActivationOutcome, ActivationRequest,
};
pub use aggregate::{BillingPeriod, NewSubscription, Subscription};
pub use status::SubscriptionStatus;
