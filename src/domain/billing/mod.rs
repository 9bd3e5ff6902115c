//! Billing reference data: plans and the entities that pay for them.

mod billed_entity;
mod plan;

pub use billed_entity::{BilledEntity, SubscriptionType};
pub use plan::{BillingInterval, Plan};
