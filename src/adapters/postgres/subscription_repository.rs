//! PostgreSQL implementation of SubscriptionRepository.
//!
//! Activation runs in one transaction holding a transaction-scoped advisory
//! lock keyed by (entity kind, entity id, plan id). The partial unique
//! indexes on open rows back this up at the schema level.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::billing::BilledEntity;
use crate::domain::foundation::{
    CompanyId, CustomerId, DomainError, PlanId, SubscriptionId, Timestamp,
};
use crate::domain::payment::PaymentMethod;
use crate::domain::subscription::{
    decide_activation, Activation, ActivationDecision, ActivationRequest, NewSubscription,
    Subscription, SubscriptionStatus,
};
use crate::ports::SubscriptionRepository;

const SUBSCRIPTION_COLUMNS: &str = r#"
    id, company_id, customer_id, plan_id, status, current_period_start, current_period_end,
    auto_renew, is_trial, payment_method, gateway_customer_id, gateway_subscription_id,
    gateway_card_id, created_at, updated_at
"#;

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    company_id: Option<i64>,
    customer_id: Option<i64>,
    plan_id: i64,
    status: String,
    current_period_start: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    auto_renew: bool,
    is_trial: bool,
    payment_method: Option<String>,
    gateway_customer_id: Option<String>,
    gateway_subscription_id: Option<String>,
    gateway_card_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let billed_entity = match (row.company_id, row.customer_id) {
            (Some(id), None) => BilledEntity::Company(CompanyId::from_db(id)),
            (None, Some(id)) => BilledEntity::Customer(CustomerId::from_db(id)),
            _ => {
                return Err(DomainError::database(format!(
                    "Subscription {} must reference exactly one of company_id/customer_id",
                    row.id
                )))
            }
        };
        Ok(Subscription {
            id: SubscriptionId::from_db(row.id),
            billed_entity,
            plan_id: PlanId::from_db(row.plan_id),
            status: row.status.parse::<SubscriptionStatus>().map_err(corrupt)?,
            current_period_start: Timestamp::from_datetime(row.current_period_start),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            auto_renew: row.auto_renew,
            is_trial: row.is_trial,
            payment_method: row
                .payment_method
                .as_deref()
                .map(str::parse::<PaymentMethod>)
                .transpose()
                .map_err(corrupt)?,
            gateway_customer_id: row.gateway_customer_id,
            gateway_subscription_id: row.gateway_subscription_id,
            gateway_card_id: row.gateway_card_id,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn corrupt(err: impl std::fmt::Display) -> DomainError {
    DomainError::database(format!("Invalid subscription row: {}", err))
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    DomainError::database(format!("{}: {}", context, err))
}

/// Advisory lock key for an (entity, plan) pair.
fn activation_lock_key(entity: BilledEntity, plan_id: PlanId) -> String {
    format!("{}:{}", entity, plan_id)
}

async fn find_open_in(
    tx: &mut Transaction<'_, Postgres>,
    entity: BilledEntity,
    plan_id: PlanId,
) -> Result<Option<Subscription>, DomainError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
        r#"
        SELECT {} FROM subscriptions
        WHERE company_id IS NOT DISTINCT FROM $1
          AND customer_id IS NOT DISTINCT FROM $2
          AND plan_id = $3
          AND status IN ('active', 'pending')
        ORDER BY id
        LIMIT 1
        FOR UPDATE
        "#,
        SUBSCRIPTION_COLUMNS
    ))
    .bind(entity.company_id().map(|id| id.as_i64()))
    .bind(entity.customer_id().map(|id| id.as_i64()))
    .bind(plan_id.as_i64())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to look up open subscription", e))?;

    row.map(Subscription::try_from).transpose()
}

async fn insert_in(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewSubscription,
    now: Timestamp,
) -> Result<Subscription, DomainError> {
    let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
        r#"
        INSERT INTO subscriptions (
            company_id, customer_id, plan_id, status, current_period_start,
            current_period_end, auto_renew, is_trial, payment_method, gateway_customer_id,
            gateway_subscription_id, gateway_card_id, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
        RETURNING {}
        "#,
        SUBSCRIPTION_COLUMNS
    ))
    .bind(new.billed_entity.company_id().map(|id| id.as_i64()))
    .bind(new.billed_entity.customer_id().map(|id| id.as_i64()))
    .bind(new.plan_id.as_i64())
    .bind(new.status.as_str())
    .bind(new.period.start.as_datetime())
    .bind(new.period.end.as_datetime())
    .bind(new.auto_renew)
    .bind(new.is_trial)
    .bind(new.payment_method.map(|m| m.as_str()))
    .bind(&new.gateway_customer_id)
    .bind(&new.gateway_subscription_id)
    .bind(&new.gateway_card_id)
    .bind(now.as_datetime())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to insert subscription", e))?;

    Subscription::try_from(row)
}

async fn update_in(
    tx: &mut Transaction<'_, Postgres>,
    subscription: &Subscription,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE subscriptions SET
            status = $2,
            current_period_start = $3,
            current_period_end = $4,
            payment_method = $5,
            updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(subscription.id.as_i64())
    .bind(subscription.status.as_str())
    .bind(subscription.current_period_start.as_datetime())
    .bind(subscription.current_period_end.as_datetime())
    .bind(subscription.payment_method.map(|m| m.as_str()))
    .bind(subscription.updated_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| db_error("Failed to update subscription", e))?;

    Ok(())
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn activate(&self, request: ActivationRequest) -> Result<Activation, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        // Released on commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(activation_lock_key(request.billed_entity, request.plan_id))
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to acquire activation lock", e))?;

        let now = Timestamp::now();
        let open = find_open_in(&mut tx, request.billed_entity, request.plan_id).await?;
        let decision = decide_activation(open, &request, now);
        let outcome = decision.outcome();

        let subscription = match decision {
            ActivationDecision::KeepActive(existing) => existing,
            ActivationDecision::Promote(updated) => {
                update_in(&mut tx, &updated).await?;
                updated
            }
            ActivationDecision::Create(new) => insert_in(&mut tx, &new, now).await?,
        };

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit activation", e))?;

        Ok(Activation {
            subscription,
            outcome,
        })
    }

    async fn find_open(
        &self,
        billed_entity: BilledEntity,
        plan_id: PlanId,
    ) -> Result<Option<Subscription>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin lookup", e))?;
        let open = find_open_in(&mut tx, billed_entity, plan_id).await?;
        tx.rollback()
            .await
            .map_err(|e| db_error("Failed to end lookup", e))?;
        Ok(open)
    }
}
