//! Subscription repository port.

use async_trait::async_trait;

use crate::domain::billing::BilledEntity;
use crate::domain::foundation::{DomainError, PlanId};
use crate::domain::subscription::{Activation, ActivationRequest, Subscription};

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Activates the subscription for the request's (entity, plan) pair.
    ///
    /// Implementations must make lookup and write atomic per pair: two
    /// concurrent calls for the same pair leave exactly one open row, and
    /// the later call observes the earlier one's result.
    async fn activate(&self, request: ActivationRequest) -> Result<Activation, DomainError>;

    /// The `active` or `pending` row for the pair, if any.
    async fn find_open(
        &self,
        billed_entity: BilledEntity,
        plan_id: PlanId,
    ) -> Result<Option<Subscription>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }
}
