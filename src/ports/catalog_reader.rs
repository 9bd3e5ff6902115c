//! Read-only access to plans and billable entities.

use async_trait::async_trait;

use crate::domain::billing::{BilledEntity, Plan};
use crate::domain::foundation::{DomainError, PlanId};

#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>, DomainError>;

    /// True when the company or customer row exists.
    async fn billed_entity_exists(&self, entity: BilledEntity) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_reader_is_object_safe() {
        fn _accepts_dyn(_reader: &dyn CatalogReader) {}
    }
}
