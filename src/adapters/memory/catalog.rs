use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::domain::billing::{BilledEntity, Plan};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::ports::CatalogReader;

/// Plans and billable entities held in memory.
#[derive(Default)]
pub struct InMemoryCatalog {
    plans: RwLock<HashMap<PlanId, Plan>>,
    entities: RwLock<HashSet<BilledEntity>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(self, plan: Plan) -> Self {
        if let Ok(mut plans) = self.plans.write() {
            plans.insert(plan.id, plan);
        }
        self
    }

    pub fn with_entity(self, entity: BilledEntity) -> Self {
        if let Ok(mut entities) = self.entities.write() {
            entities.insert(entity);
        }
        self
    }
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "InMemoryCatalog: lock poisoned")
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>, DomainError> {
        let plans = self.plans.read().map_err(|_| poisoned())?;
        Ok(plans.get(&id).cloned())
    }

    async fn billed_entity_exists(&self, entity: BilledEntity) -> Result<bool, DomainError> {
        let entities = self.entities.read().map_err(|_| poisoned())?;
        Ok(entities.contains(&entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BillingInterval;
    use crate::domain::foundation::{CompanyId, CustomerId, Money};

    #[tokio::test]
    async fn resolves_seeded_plan_and_entity() {
        let plan = Plan::new(
            PlanId::new(1).unwrap(),
            "Pro",
            Money::brl(9990).unwrap(),
            BillingInterval::Monthly,
        );
        let customer = BilledEntity::Customer(CustomerId::new(7).unwrap());
        let catalog = InMemoryCatalog::new().with_plan(plan.clone()).with_entity(customer);

        assert_eq!(catalog.find_plan(plan.id).await.unwrap(), Some(plan));
        assert!(catalog.billed_entity_exists(customer).await.unwrap());
    }

    #[tokio::test]
    async fn entity_kind_is_part_of_identity() {
        let catalog = InMemoryCatalog::new()
            .with_entity(BilledEntity::Customer(CustomerId::new(7).unwrap()));
        let company = BilledEntity::Company(CompanyId::new(7).unwrap());
        assert!(!catalog.billed_entity_exists(company).await.unwrap());
    }
}
