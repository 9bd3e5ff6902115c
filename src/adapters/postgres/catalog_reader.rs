//! PostgreSQL catalog reader over the back-office tables.

use async_trait::async_trait;

use crate::domain::billing::{BilledEntity, BillingInterval, Plan};
use crate::domain::foundation::{DomainError, Money, PlanId};
use crate::ports::CatalogReader;

pub struct PostgresCatalogReader {
    pool: sqlx::PgPool,
}

impl PostgresCatalogReader {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: i64,
    name: String,
    price_cents: i64,
    currency: String,
    billing_interval: String,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let invalid = |e: crate::domain::foundation::ValidationError| {
            DomainError::database(format!("Invalid plan row {}: {}", row.id, e))
        };
        Ok(Plan {
            id: PlanId::from_db(row.id),
            price: Money::new(row.price_cents, row.currency.as_str()).map_err(invalid)?,
            interval: row.billing_interval.parse::<BillingInterval>().map_err(invalid)?,
            name: row.name,
        })
    }
}

#[async_trait]
impl CatalogReader for PostgresCatalogReader {
    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>, DomainError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, name, price_cents, currency, billing_interval
            FROM plans
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch plan: {}", e)))?;

        row.map(Plan::try_from).transpose()
    }

    async fn billed_entity_exists(&self, entity: BilledEntity) -> Result<bool, DomainError> {
        let sql = match entity {
            BilledEntity::Company(_) => {
                "SELECT EXISTS (SELECT 1 FROM companies WHERE id = $1 AND deleted_at IS NULL)"
            }
            BilledEntity::Customer(_) => {
                "SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1 AND deleted_at IS NULL)"
            }
        };
        sqlx::query_scalar::<_, bool>(sql)
            .bind(entity.raw_id())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to check {}: {}", entity, e)))
    }
}
