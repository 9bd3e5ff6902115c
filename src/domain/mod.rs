//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, money, timestamps, errors, state machine)
//! - `billing` - Plans and billed entities (company or customer)
//! - `payment` - Payment aggregate and its status lifecycle
//! - `subscription` - Subscription aggregate and activation rules
//! - `gateway` - Normalised gateway events, charge statuses, webhook signatures
//! - `checkout` - Checkout request validation and the client step machine

pub mod billing;
pub mod checkout;
pub mod foundation;
pub mod gateway;
pub mod payment;
pub mod subscription;
